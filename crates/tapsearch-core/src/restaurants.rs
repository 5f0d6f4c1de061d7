use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;
use crate::geo::Located;
use crate::CoreError;

pub const MAX_RATING: f64 = 5.0;

/// A searchable restaurant row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub rating: f64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_building_id: Option<BuildingId>,
}

impl Restaurant {
    /// Checks the rating bound and coordinate ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRating`] or [`CoreError::InvalidCoordinate`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(CoreError::InvalidRating(self.rating));
        }
        crate::geo::Coordinates::new(self.lat, self.lng).map_err(|e| match e {
            CoreError::InvalidCoordinate(reason) => {
                CoreError::InvalidCoordinate(format!("restaurant {}: {reason}", self.id))
            }
            other => other,
        })?;
        Ok(())
    }
}

impl Located for Restaurant {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lng(&self) -> f64 {
        self.lng
    }
}
