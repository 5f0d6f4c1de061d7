//! YAML seed dataset and an in-memory search over it.
//!
//! The service answers from Postgres; this in-memory rendition backs the
//! client's opt-in offline fallback and doubles as the reference behaviour
//! the SQL queries are tested against.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingId};
use crate::geo::{nearest, Coordinates};
use crate::restaurants::Restaurant;
use crate::search::{OptimizedSearchResponse, SearchError, SearchResponse};
use crate::ConfigError;

const SAMPLE_DATASET: &str = include_str!("../../../config/dataset.yaml");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
}

/// Load and validate a dataset from a YAML file.
///
/// # Errors
///
/// Returns [`ConfigError::DatasetIo`] if the file cannot be read,
/// [`ConfigError::DatasetParse`] if it is not valid YAML for [`Dataset`]
/// (including malformed polygon rings), or [`ConfigError::InvalidDataset`]
/// if a restaurant fails validation.
pub fn load_dataset(path: &Path) -> Result<Dataset, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::DatasetIo {
        path: path.display().to_string(),
        source,
    })?;
    Dataset::from_yaml(&raw, &path.display().to_string())
}

impl Dataset {
    /// Parse and validate YAML text; `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// See [`load_dataset`].
    pub fn from_yaml(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let dataset: Dataset =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::DatasetParse {
                path: origin.to_owned(),
                source,
            })?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// The small Tokyo dataset bundled with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled file itself is broken.
    pub fn sample() -> Result<Self, ConfigError> {
        Self::from_yaml(SAMPLE_DATASET, "<bundled sample>")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for restaurant in &self.restaurants {
            restaurant
                .validate()
                .map_err(|e| ConfigError::InvalidDataset(e.to_string()))?;
            if !seen.insert(restaurant.id.as_str()) {
                return Err(ConfigError::InvalidDataset(format!(
                    "duplicate restaurant id {}",
                    restaurant.id
                )));
            }
            if let Some(id) = &restaurant.osm_building_id {
                if self.building(id).is_none() {
                    tracing::warn!(
                        restaurant_id = %restaurant.id,
                        osm_id = %id,
                        "restaurant references a building missing from the dataset"
                    );
                }
            }
        }
        Ok(())
    }

    /// Exact-match building lookup.
    #[must_use]
    pub fn building(&self, id: &BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| &b.osm_id == id)
    }

    /// Nearest restaurant with its footprint embedded.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotFound`] when the dataset has no restaurants.
    pub fn search_full(&self, query: &Coordinates) -> Result<SearchResponse, SearchError> {
        let hit = nearest(&self.restaurants, query).ok_or_else(no_restaurants)?;
        let feature = hit
            .record
            .osm_building_id
            .as_ref()
            .and_then(|id| self.building(id))
            .map(Building::to_feature);
        Ok(SearchResponse::new(hit.record.clone(), feature, hit.distance))
    }

    /// Nearest restaurant with only its building id.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotFound`] when the dataset has no restaurants.
    pub fn search_optimized(
        &self,
        query: &Coordinates,
    ) -> Result<OptimizedSearchResponse, SearchError> {
        let hit = nearest(&self.restaurants, query).ok_or_else(no_restaurants)?;
        Ok(OptimizedSearchResponse::new(
            hit.record.clone(),
            hit.distance,
        ))
    }
}

fn no_restaurants() -> SearchError {
    SearchError::NotFound("no restaurants found".to_owned())
}
