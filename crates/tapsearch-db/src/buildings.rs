//! Database operations for the `buildings` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tapsearch_core::{Building, BuildingId, PolygonRing};

use crate::DbError;

/// A row from the `buildings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BuildingRow {
    pub osm_id: String,
    pub name: Option<String>,
    pub building_type: Option<String>,
    pub building_levels: Option<i32>,
    pub building_material: Option<String>,
    pub building_use: Option<String>,
    pub geometry_coordinates: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BuildingRow {
    /// Convert the row into a domain [`Building`], validating the stored ring.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptGeometry`] if `geometry_coordinates` is not a
    /// polygon coordinate array with a valid outer ring.
    pub fn into_building(self) -> Result<Building, DbError> {
        let ring = outer_ring_from_json(&self.osm_id, self.geometry_coordinates)?;
        Ok(Building {
            osm_id: BuildingId::new(self.osm_id),
            name: self.name,
            building_type: self.building_type,
            levels: self.building_levels,
            material: self.building_material,
            building_use: self.building_use,
            ring,
        })
    }
}

/// Parse `[[[lng, lat], ...], ...]` and return the validated outer ring.
pub(crate) fn outer_ring_from_json(
    osm_id: &str,
    value: serde_json::Value,
) -> Result<PolygonRing, DbError> {
    let corrupt = |reason: String| DbError::CorruptGeometry {
        osm_id: osm_id.to_owned(),
        reason,
    };

    let rings: Vec<Vec<[f64; 2]>> =
        serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
    let outer = rings
        .into_iter()
        .next()
        .ok_or_else(|| corrupt("polygon has no rings".to_owned()))?;
    PolygonRing::new(outer).map_err(|e| corrupt(e.to_string()))
}

/// Serialize a ring into the stored polygon coordinate shape.
pub(crate) fn ring_to_json(ring: &PolygonRing) -> serde_json::Value {
    serde_json::json!([ring.vertices()])
}

/// Fetch a single building by its OSM id.
///
/// Returns `None` when no building has that id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_building_by_osm_id(
    pool: &PgPool,
    osm_id: &str,
) -> Result<Option<BuildingRow>, DbError> {
    let row = sqlx::query_as::<_, BuildingRow>(
        "SELECT osm_id, name, building_type, building_levels, building_material, \
                building_use, geometry_coordinates, created_at, updated_at \
         FROM buildings \
         WHERE osm_id = $1",
    )
    .bind(osm_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List every building ordered by OSM id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_buildings(pool: &PgPool) -> Result<Vec<BuildingRow>, DbError> {
    let rows = sqlx::query_as::<_, BuildingRow>(
        "SELECT osm_id, name, building_type, building_levels, building_material, \
                building_use, geometry_coordinates, created_at, updated_at \
         FROM buildings \
         ORDER BY osm_id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
