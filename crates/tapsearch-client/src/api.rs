//! Seams between the map controller and whatever answers its questions.

use async_trait::async_trait;
use tapsearch_core::{
    BuildingFeature, BuildingId, Coordinates, Dataset, OptimizedSearchResponse, Restaurant,
    SearchMode, SearchResponse,
};

use crate::error::ClientError;

/// A search result in whichever shape the mode asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Full(SearchResponse),
    Optimized(OptimizedSearchResponse),
}

impl SearchOutcome {
    #[must_use]
    pub fn restaurant(&self) -> &Restaurant {
        match self {
            SearchOutcome::Full(r) => &r.restaurant,
            SearchOutcome::Optimized(r) => &r.restaurant,
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            SearchOutcome::Full(r) => r.message.as_deref(),
            SearchOutcome::Optimized(r) => r.message.as_deref(),
        }
    }

    #[must_use]
    pub fn distance(&self) -> f64 {
        match self {
            SearchOutcome::Full(r) => r.distance,
            SearchOutcome::Optimized(r) => r.distance,
        }
    }

    #[must_use]
    pub fn mode(&self) -> SearchMode {
        match self {
            SearchOutcome::Full(_) => SearchMode::Full,
            SearchOutcome::Optimized(_) => SearchMode::Optimized,
        }
    }
}

/// Answers "what is the nearest restaurant to this point".
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(
        &self,
        point: Coordinates,
        mode: SearchMode,
    ) -> Result<SearchOutcome, ClientError>;
}

/// Looks up a building footprint by id.
///
/// `Ok(None)` means the provider has no such building.
#[async_trait]
pub trait GeometryProvider: Send + Sync {
    async fn fetch_building(&self, id: &BuildingId)
        -> Result<Option<BuildingFeature>, ClientError>;
}

#[async_trait]
impl SearchApi for Dataset {
    async fn search(
        &self,
        point: Coordinates,
        mode: SearchMode,
    ) -> Result<SearchOutcome, ClientError> {
        let outcome = match mode {
            SearchMode::Full => SearchOutcome::Full(self.search_full(&point)?),
            SearchMode::Optimized => SearchOutcome::Optimized(self.search_optimized(&point)?),
        };
        Ok(outcome)
    }
}

#[async_trait]
impl GeometryProvider for Dataset {
    async fn fetch_building(
        &self,
        id: &BuildingId,
    ) -> Result<Option<BuildingFeature>, ClientError> {
        Ok(self.building(id).map(tapsearch_core::Building::to_feature))
    }
}

#[async_trait]
impl<T: SearchApi + ?Sized> SearchApi for std::sync::Arc<T> {
    async fn search(
        &self,
        point: Coordinates,
        mode: SearchMode,
    ) -> Result<SearchOutcome, ClientError> {
        (**self).search(point, mode).await
    }
}

#[async_trait]
impl<T: GeometryProvider + ?Sized> GeometryProvider for std::sync::Arc<T> {
    async fn fetch_building(
        &self,
        id: &BuildingId,
    ) -> Result<Option<BuildingFeature>, ClientError> {
        (**self).fetch_building(id).await
    }
}
