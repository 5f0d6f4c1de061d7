//! Building-geometry lookup with a process-lifetime cache.

use std::collections::HashMap;

use tapsearch_core::{BuildingFeature, BuildingId};
use tokio::sync::Mutex;

use crate::api::GeometryProvider;
use crate::error::ClientError;

/// Result of resolving a building id.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Available(BuildingFeature),
    /// The provider has no building with that id.
    Unavailable,
}

/// Resolves building ids to footprints, remembering every hit.
///
/// Entries are never evicted or invalidated. Misses and errors are not cached,
/// so a later call asks the provider again.
pub struct GeometryResolver<P> {
    provider: P,
    cache: Mutex<HashMap<BuildingId, BuildingFeature>>,
}

impl<P: GeometryProvider> GeometryResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Cache first, then the provider.
    ///
    /// The cache lock is released before the provider is called, so two
    /// concurrent misses for the same id may both fetch; the second insert
    /// simply overwrites an identical entry.
    ///
    /// # Errors
    ///
    /// Propagates provider failures other than "not found".
    pub async fn resolve(&self, id: &BuildingId) -> Result<Geometry, ClientError> {
        if let Some(feature) = self.cache.lock().await.get(id) {
            tracing::debug!(osm_id = %id, "building geometry cache hit");
            return Ok(Geometry::Available(feature.clone()));
        }

        match self.provider.fetch_building(id).await? {
            Some(feature) => {
                tracing::debug!(osm_id = %id, "building geometry fetched");
                self.cache.lock().await.insert(id.clone(), feature.clone());
                Ok(Geometry::Available(feature))
            }
            None => {
                tracing::info!(osm_id = %id, "building geometry unavailable");
                Ok(Geometry::Unavailable)
            }
        }
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}
