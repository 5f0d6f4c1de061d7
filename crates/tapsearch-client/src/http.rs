//! HTTP client for the tapsearch Query Service.
//!
//! Every call carries a request timeout and a connect timeout and is retried
//! with back-off on transient failures. 400 and 404 answers are surfaced as
//! [`ClientError::InvalidRequest`] and [`ClientError::NotFound`] using the
//! service's error message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tapsearch_core::{
    BuildingFeature, BuildingId, ClientConfig, Coordinates, OptimizedSearchResponse, Restaurant,
    SearchMode, SearchResponse,
};

use crate::api::{GeometryProvider, SearchApi, SearchOutcome};
use crate::error::ClientError;
use crate::retry::retry_with_backoff;

const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize)]
struct SearchBody {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Client for the tapsearch REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpApiClient {
    /// Builds a client from loaded [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if the configured URL is unusable.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    /// Creates a client with explicit settings (used with wiremock in tests).
    ///
    /// # Errors
    ///
    /// See [`HttpApiClient::from_config`].
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("tapsearch-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Exactly one trailing slash; `endpoint` pops the empty last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: normalised,
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// `POST /api/v1/restaurants/search`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidRequest`] / [`ClientError::NotFound`] for 400 / 404.
    /// - [`ClientError::Http`] or [`ClientError::UnexpectedStatus`] once retries
    ///   are exhausted.
    /// - [`ClientError::Deserialize`] if the body is not a search response.
    pub async fn search_full(&self, point: Coordinates) -> Result<SearchResponse, ClientError> {
        let url = self.endpoint(&["api", "v1", "restaurants", "search"])?;
        self.post_json(&url, &SearchBody::from(point)).await
    }

    /// `POST /api/v1/restaurants/search/optimized`.
    ///
    /// # Errors
    ///
    /// See [`HttpApiClient::search_full`].
    pub async fn search_optimized(
        &self,
        point: Coordinates,
    ) -> Result<OptimizedSearchResponse, ClientError> {
        let url = self.endpoint(&["api", "v1", "restaurants", "search", "optimized"])?;
        self.post_json(&url, &SearchBody::from(point)).await
    }

    /// `GET /api/v1/buildings/{osm_id}`; a 404 becomes `Ok(None)`.
    ///
    /// # Errors
    ///
    /// See [`HttpApiClient::search_full`].
    pub async fn get_building(
        &self,
        id: &BuildingId,
    ) -> Result<Option<BuildingFeature>, ClientError> {
        let url = self.endpoint(&["api", "v1", "buildings", id.as_str()])?;
        match self.get_json::<BuildingFeature>(&url).await {
            Ok(feature) => Ok(Some(feature)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `GET /api/v1/restaurants`, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// See [`HttpApiClient::search_full`].
    pub async fn list_restaurants(
        &self,
        name: Option<&str>,
    ) -> Result<Vec<Restaurant>, ClientError> {
        let mut url = self.endpoint(&["api", "v1", "restaurants"])?;
        if let Some(name) = name {
            url.query_pairs_mut().append_pair("name", name);
        }
        let envelope: DataEnvelope<Vec<Restaurant>> = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    /// `GET /api/v1/health`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "v1", "health"])?;
        let _: serde_json::Value = self.get_json(&url).await?;
        Ok(())
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be used as a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.post(url.clone()).json(body).send().await?;
            Self::decode(url, response).await
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            Self::decode(url, response).await
        })
        .await
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => {
                serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                    context: url.path().to_owned(),
                    source: e,
                })
            }
            StatusCode::BAD_REQUEST => Err(ClientError::InvalidRequest(error_message(&body))),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(error_message(&body))),
            other => Err(ClientError::UnexpectedStatus {
                status: other,
                url: url.to_string(),
            }),
        }
    }
}

impl From<Coordinates> for SearchBody {
    fn from(point: Coordinates) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
        }
    }
}

/// The service's `error.message`, or the raw body when it is not an envelope.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_owned())
}

#[async_trait]
impl SearchApi for HttpApiClient {
    async fn search(
        &self,
        point: Coordinates,
        mode: SearchMode,
    ) -> Result<SearchOutcome, ClientError> {
        let outcome = match mode {
            SearchMode::Full => SearchOutcome::Full(self.search_full(point).await?),
            SearchMode::Optimized => {
                SearchOutcome::Optimized(self.search_optimized(point).await?)
            }
        };
        Ok(outcome)
    }
}

#[async_trait]
impl GeometryProvider for HttpApiClient {
    async fn fetch_building(
        &self,
        id: &BuildingId,
    ) -> Result<Option<BuildingFeature>, ClientError> {
        self.get_building(id).await
    }
}
