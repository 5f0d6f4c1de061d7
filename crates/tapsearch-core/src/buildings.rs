//! Building footprints and their `GeoJSON` feature shape.
//!
//! Polygon vertices are always `[lng, lat]` pairs, matching `GeoJSON`. Point
//! records (restaurants, taps) use named `lat`/`lng` fields instead, so the
//! two never get confused in a bare array.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::CoreError;

/// Building type tag used when the dataset leaves it blank.
pub const DEFAULT_BUILDING_TYPE: &str = "yes";

/// Opaque building identifier (for example `way/1081064846`).
///
/// Older datasets stored numeric ids; those are accepted on input and
/// normalized to their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BuildingId(String);

impl BuildingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BuildingId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for BuildingId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for BuildingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Ok(Self(s)),
            Raw::Signed(n) => Ok(Self(n.to_string())),
            Raw::Unsigned(n) => Ok(Self(n.to_string())),
        }
    }
}

/// A closed outer ring of `[lng, lat]` vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct PolygonRing(Vec<[f64; 2]>);

impl PolygonRing {
    /// Validates and wraps a vertex list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPolygon`] if the ring has fewer than four
    /// vertices, is not closed, or has a vertex outside WGS84 bounds.
    pub fn new(vertices: Vec<[f64; 2]>) -> Result<Self, CoreError> {
        if vertices.len() < 4 {
            return Err(CoreError::InvalidPolygon(format!(
                "ring needs at least 4 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.first() != vertices.last() {
            return Err(CoreError::InvalidPolygon(
                "ring is not closed: first and last vertex differ".to_owned(),
            ));
        }
        for [lng, lat] in &vertices {
            if !(-180.0..=180.0).contains(lng) || !(-90.0..=90.0).contains(lat) {
                return Err(CoreError::InvalidPolygon(format!(
                    "vertex [{lng}, {lat}] is outside WGS84 bounds"
                )));
            }
        }
        Ok(Self(vertices))
    }

    #[must_use]
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.0
    }
}

impl TryFrom<Vec<[f64; 2]>> for PolygonRing {
    type Error = CoreError;

    fn try_from(value: Vec<[f64; 2]>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PolygonRing> for Vec<[f64; 2]> {
    fn from(value: PolygonRing) -> Self {
        value.0
    }
}

/// A building record as stored in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub osm_id: BuildingId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub levels: Option<i32>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub building_use: Option<String>,
    pub ring: PolygonRing,
}

impl Building {
    /// Shapes the record into a `GeoJSON` feature.
    #[must_use]
    pub fn to_feature(&self) -> BuildingFeature {
        BuildingFeature {
            kind: FeatureKind::Feature,
            properties: FeatureProperties {
                building: Some(
                    self.building_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_BUILDING_TYPE.to_owned()),
                ),
                osm_id: Some(self.osm_id.clone()),
                name: self.name.clone(),
                levels: self.levels.map(|l| l.to_string()),
                material: self.material.clone(),
                building_use: self.building_use.clone(),
            },
            geometry: PolygonGeometry {
                kind: GeometryKind::Polygon,
                coordinates: vec![self.ring.clone()],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Polygon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<BuildingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "building:levels",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub levels: Option<String>,
    #[serde(
        rename = "building:material",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub material: Option<String>,
    #[serde(
        rename = "building:use",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub building_use: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    /// Outer ring first; any further rings are holes.
    pub coordinates: Vec<PolygonRing>,
}

/// A building footprint as a `GeoJSON` `Feature` with `Polygon` geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingFeature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(default)]
    pub properties: FeatureProperties,
    pub geometry: PolygonGeometry,
}

impl BuildingFeature {
    /// The outer ring, if the geometry has one.
    #[must_use]
    pub fn outer_ring(&self) -> Option<&PolygonRing> {
        self.geometry.coordinates.first()
    }
}
