use async_trait::async_trait;
use tapsearch_core::{
    BuildingFeature, BuildingId, ConfigError, Coordinates, Dataset, FallbackPolicy, SearchMode,
};

use crate::api::{GeometryProvider, SearchApi, SearchOutcome};
use crate::error::{ClientError, ErrorKind};

/// Wraps a live API and, under [`FallbackPolicy::Mock`], answers from the
/// bundled sample dataset when the live API is unreachable.
///
/// Only [`ErrorKind::Upstream`] failures are substituted; invalid requests and
/// genuine "not found" answers always pass through.
#[derive(Debug, Clone)]
pub struct FallbackSearchApi<A> {
    inner: A,
    policy: FallbackPolicy,
    mock: Dataset,
}

impl<A> FallbackSearchApi<A> {
    /// # Errors
    ///
    /// Returns [`ConfigError`] only if the bundled sample dataset is broken.
    pub fn new(inner: A, policy: FallbackPolicy) -> Result<Self, ConfigError> {
        Ok(Self::with_dataset(inner, policy, Dataset::sample()?))
    }

    #[must_use]
    pub fn with_dataset(inner: A, policy: FallbackPolicy, mock: Dataset) -> Self {
        Self {
            inner,
            policy,
            mock,
        }
    }

    #[must_use]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn substitutes(&self, err: &ClientError) -> bool {
        self.policy == FallbackPolicy::Mock && err.kind() == ErrorKind::Upstream
    }
}

#[async_trait]
impl<A: SearchApi> SearchApi for FallbackSearchApi<A> {
    async fn search(
        &self,
        point: Coordinates,
        mode: SearchMode,
    ) -> Result<SearchOutcome, ClientError> {
        match self.inner.search(point, mode).await {
            Err(err) if self.substitutes(&err) => {
                tracing::warn!(
                    error = %err,
                    lat = point.lat,
                    lng = point.lng,
                    %mode,
                    "search API unavailable, answering from sample data"
                );
                self.mock.search(point, mode).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl<A: GeometryProvider> GeometryProvider for FallbackSearchApi<A> {
    async fn fetch_building(
        &self,
        id: &BuildingId,
    ) -> Result<Option<BuildingFeature>, ClientError> {
        match self.inner.fetch_building(id).await {
            Err(err) if self.substitutes(&err) => {
                tracing::warn!(
                    error = %err,
                    osm_id = %id,
                    "geometry API unavailable, answering from sample data"
                );
                self.mock.fetch_building(id).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    struct Down;

    #[async_trait]
    impl SearchApi for Down {
        async fn search(&self, _: Coordinates, _: SearchMode) -> Result<SearchOutcome, ClientError> {
            Err(ClientError::UnexpectedStatus {
                status: StatusCode::BAD_GATEWAY,
                url: "http://api/search".to_owned(),
            })
        }
    }

    struct Rejects;

    #[async_trait]
    impl SearchApi for Rejects {
        async fn search(&self, _: Coordinates, _: SearchMode) -> Result<SearchOutcome, ClientError> {
            Err(ClientError::InvalidRequest("lat and lng are required".to_owned()))
        }
    }

    fn tokyo() -> Coordinates {
        Coordinates::new(35.6822, 139.6820).expect("valid point")
    }

    #[tokio::test]
    async fn fail_policy_surfaces_upstream_errors() {
        let api = FallbackSearchApi::new(Down, FallbackPolicy::Fail).expect("sample parses");
        let err = api
            .search(tokyo(), SearchMode::Optimized)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn mock_policy_answers_from_sample_data() {
        let api = FallbackSearchApi::new(Down, FallbackPolicy::Mock).expect("sample parses");
        let outcome = api
            .search(tokyo(), SearchMode::Full)
            .await
            .expect("mock answer");
        assert_eq!(outcome.mode(), SearchMode::Full);
        assert!(!outcome.restaurant().id.is_empty());
    }

    #[tokio::test]
    async fn mock_policy_never_masks_invalid_requests() {
        let api = FallbackSearchApi::new(Rejects, FallbackPolicy::Mock).expect("sample parses");
        let err = api
            .search(tokyo(), SearchMode::Optimized)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
