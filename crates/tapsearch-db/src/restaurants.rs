//! Database operations for the `restaurants` table.
//!
//! Distance is the planar degree distance `sqrt(dlat^2 + dlng^2)`, computed in
//! SQL so the nearest row is chosen without loading the table. Ties resolve to
//! the lowest `seq` (insertion order).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tapsearch_core::{Building, BuildingId, Restaurant};

use crate::buildings::outer_ring_from_json;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `restaurants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RestaurantRow {
    pub seq: i64,
    pub id: String,
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub rating: Decimal,
    pub lat: f64,
    pub lng: f64,
    pub osm_building_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RestaurantRow {
    #[must_use]
    pub fn into_restaurant(self) -> Restaurant {
        Restaurant {
            rating: self.rating.to_f64().unwrap_or_default(),
            id: self.id,
            name: self.name,
            address: self.address,
            opening_hours: self.opening_hours,
            lat: self.lat,
            lng: self.lng,
            osm_building_id: self.osm_building_id.map(BuildingId::new),
        }
    }
}

/// Building columns brought in by a `LEFT JOIN`; all `NULL` when the
/// restaurant has no linked building.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JoinedBuildingColumns {
    pub building_osm_id: Option<String>,
    pub building_name: Option<String>,
    pub building_type: Option<String>,
    pub building_levels: Option<i32>,
    pub building_material: Option<String>,
    pub building_use: Option<String>,
    pub building_geometry: Option<serde_json::Value>,
}

impl JoinedBuildingColumns {
    /// The joined building, if present and its stored geometry is usable.
    ///
    /// Unusable geometry is logged and treated as absent so the restaurant
    /// itself is still returned.
    #[must_use]
    pub fn into_building(self) -> Option<Building> {
        let osm_id = self.building_osm_id?;
        let geometry = self.building_geometry?;
        match outer_ring_from_json(&osm_id, geometry) {
            Ok(ring) => Some(Building {
                osm_id: BuildingId::new(osm_id),
                name: self.building_name,
                building_type: self.building_type,
                levels: self.building_levels,
                material: self.building_material,
                building_use: self.building_use,
                ring,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "dropping unusable building geometry");
                None
            }
        }
    }
}

/// A restaurant with its planar distance from the query point.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NearestRestaurantRow {
    #[sqlx(flatten)]
    pub restaurant: RestaurantRow,
    pub distance: f64,
}

/// A restaurant, its distance, and its joined building columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NearestRestaurantWithBuildingRow {
    #[sqlx(flatten)]
    pub restaurant: RestaurantRow,
    #[sqlx(flatten)]
    pub building: JoinedBuildingColumns,
    pub distance: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RestaurantWithBuildingRow {
    #[sqlx(flatten)]
    pub restaurant: RestaurantRow,
    #[sqlx(flatten)]
    pub building: JoinedBuildingColumns,
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

/// Find the restaurant closest to `(lat, lng)` without touching `buildings`.
///
/// Returns `None` when the table is empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_nearest_restaurant(
    pool: &PgPool,
    lat: f64,
    lng: f64,
) -> Result<Option<NearestRestaurantRow>, DbError> {
    let row = sqlx::query_as::<_, NearestRestaurantRow>(
        "SELECT r.seq, r.id, r.name, r.address, r.opening_hours, r.rating, \
                r.lat, r.lng, r.osm_building_id, r.created_at, r.updated_at, \
                SQRT(POWER(r.lat - $1, 2) + POWER(r.lng - $2, 2)) AS distance \
         FROM restaurants r \
         ORDER BY distance ASC, r.seq ASC \
         LIMIT 1",
    )
    .bind(lat)
    .bind(lng)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Find the closest restaurant together with its linked building, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_nearest_restaurant_with_building(
    pool: &PgPool,
    lat: f64,
    lng: f64,
) -> Result<Option<NearestRestaurantWithBuildingRow>, DbError> {
    let row = sqlx::query_as::<_, NearestRestaurantWithBuildingRow>(
        "SELECT r.seq, r.id, r.name, r.address, r.opening_hours, r.rating, \
                r.lat, r.lng, r.osm_building_id, r.created_at, r.updated_at, \
                b.osm_id            AS building_osm_id, \
                b.name              AS building_name, \
                b.building_type     AS building_type, \
                b.building_levels   AS building_levels, \
                b.building_material AS building_material, \
                b.building_use      AS building_use, \
                b.geometry_coordinates AS building_geometry, \
                SQRT(POWER(r.lat - $1, 2) + POWER(r.lng - $2, 2)) AS distance \
         FROM restaurants r \
         LEFT JOIN buildings b ON b.osm_id = r.osm_building_id \
         ORDER BY distance ASC, r.seq ASC \
         LIMIT 1",
    )
    .bind(lat)
    .bind(lng)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All restaurants within `radius_deg` of `(lat, lng)`, nearest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_restaurants_within_radius(
    pool: &PgPool,
    lat: f64,
    lng: f64,
    radius_deg: f64,
) -> Result<Vec<NearestRestaurantRow>, DbError> {
    let rows = sqlx::query_as::<_, NearestRestaurantRow>(
        "WITH measured AS ( \
             SELECT r.seq, r.id, r.name, r.address, r.opening_hours, r.rating, \
                    r.lat, r.lng, r.osm_building_id, r.created_at, r.updated_at, \
                    SQRT(POWER(r.lat - $1, 2) + POWER(r.lng - $2, 2)) AS distance \
             FROM restaurants r \
         ) \
         SELECT seq, id, name, address, opening_hours, rating, lat, lng, \
                osm_building_id, created_at, updated_at, distance \
         FROM measured \
         WHERE distance <= $3 \
         ORDER BY distance ASC, seq ASC",
    )
    .bind(lat)
    .bind(lng)
    .bind(radius_deg)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List restaurants ordered by `rating DESC, id ASC`.
///
/// When `name` is given, only restaurants whose name contains it
/// (case-insensitive) are returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_restaurants_by_rating(
    pool: &PgPool,
    name: Option<&str>,
) -> Result<Vec<RestaurantRow>, DbError> {
    let rows = sqlx::query_as::<_, RestaurantRow>(
        "SELECT seq, id, name, address, opening_hours, rating, lat, lng, \
                osm_building_id, created_at, updated_at \
         FROM restaurants \
         WHERE ($1::TEXT IS NULL OR STRPOS(LOWER(name), LOWER($1::TEXT)) > 0) \
         ORDER BY rating DESC, id ASC",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch one restaurant by id with its linked building columns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_restaurant_with_building(
    pool: &PgPool,
    id: &str,
) -> Result<Option<RestaurantWithBuildingRow>, DbError> {
    let row = sqlx::query_as::<_, RestaurantWithBuildingRow>(
        "SELECT r.seq, r.id, r.name, r.address, r.opening_hours, r.rating, \
                r.lat, r.lng, r.osm_building_id, r.created_at, r.updated_at, \
                b.osm_id            AS building_osm_id, \
                b.name              AS building_name, \
                b.building_type     AS building_type, \
                b.building_levels   AS building_levels, \
                b.building_material AS building_material, \
                b.building_use      AS building_use, \
                b.geometry_coordinates AS building_geometry \
         FROM restaurants r \
         LEFT JOIN buildings b ON b.osm_id = r.osm_building_id \
         WHERE r.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
