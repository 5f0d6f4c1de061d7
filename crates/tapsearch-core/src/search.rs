//! Search request validation and the two response shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::buildings::{BuildingFeature, BuildingId};
use crate::geo::Coordinates;
use crate::restaurants::Restaurant;

/// Rough kilometres per degree used to turn a radius into degree space.
pub const KM_PER_DEGREE: f64 = 111.0;
pub const DEFAULT_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Missing, non-numeric, or out-of-range input. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Empty dataset or unknown identifier.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Which payload shape a search returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Embed the building polygon in the search response.
    Full,
    /// Return only the building id; geometry is fetched separately.
    #[default]
    Optimized,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Full => write!(f, "full"),
            SearchMode::Optimized => write!(f, "optimized"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SearchMode::Full),
            "optimized" => Ok(SearchMode::Optimized),
            other => Err(format!("unknown search mode '{other}' (expected full|optimized)")),
        }
    }
}

/// Search body as received, before validation.
///
/// Fields stay as raw JSON so that "missing" and "not a number" can be told
/// apart and both reported as [`SearchError::InvalidRequest`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoordinates {
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lng: Option<Value>,
}

impl RawCoordinates {
    /// Validates presence, numeric form, and WGS84 range.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] describing the first problem.
    pub fn validate(&self) -> Result<Coordinates, SearchError> {
        let (Some(lat), Some(lng)) = (present(self.lat.as_ref()), present(self.lng.as_ref()))
        else {
            return Err(SearchError::InvalidRequest(
                "lat and lng are required".to_owned(),
            ));
        };
        let lat = numeric("lat", lat)?;
        let lng = numeric("lng", lng)?;
        Coordinates::new(lat, lng).map_err(|e| SearchError::InvalidRequest(e.to_string()))
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn numeric(field: &str, value: &Value) -> Result<f64, SearchError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| SearchError::InvalidRequest(format!("{field} must be a number")))
}

/// Radius search body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyRequest {
    #[serde(flatten)]
    pub point: RawCoordinates,
    #[serde(default)]
    pub radius_km: Option<Value>,
}

impl NearbyRequest {
    /// Returns the query point and the radius converted to degrees.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] for bad coordinates or a radius
    /// outside `(0, 50]` km.
    pub fn validate(&self) -> Result<(Coordinates, f64), SearchError> {
        let point = self.point.validate()?;
        let radius_km = match present(self.radius_km.as_ref()) {
            Some(v) => numeric("radius_km", v)?,
            None => DEFAULT_RADIUS_KM,
        };
        if radius_km <= 0.0 || radius_km > MAX_RADIUS_KM {
            return Err(SearchError::InvalidRequest(format!(
                "radius_km must be greater than 0 and at most {MAX_RADIUS_KM}"
            )));
        }
        Ok((point, radius_km / KM_PER_DEGREE))
    }
}

/// Full-mode result: restaurant plus its embedded footprint, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub restaurant: Restaurant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_polygon: Option<BuildingFeature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub distance: f64,
}

impl SearchResponse {
    #[must_use]
    pub fn new(restaurant: Restaurant, building: Option<BuildingFeature>, distance: f64) -> Self {
        let message = Some(format!("{} found", restaurant.name));
        Self {
            restaurant,
            building_polygon: building,
            message,
            distance,
        }
    }
}

/// Optimized-mode result: restaurant plus a bare building id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedSearchResponse {
    pub restaurant: Restaurant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_building_id: Option<BuildingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub distance: f64,
}

impl OptimizedSearchResponse {
    #[must_use]
    pub fn new(restaurant: Restaurant, distance: f64) -> Self {
        let message = Some(format!("{} found (optimized lookup)", restaurant.name));
        Self {
            osm_building_id: restaurant.osm_building_id.clone(),
            restaurant,
            message,
            distance,
        }
    }
}

/// One row of a radius search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyRestaurant {
    pub restaurant: Restaurant,
    pub distance: f64,
}
