use rust_decimal::Decimal;
use sqlx::PgPool;
use tapsearch_core::Dataset;

use crate::buildings::ring_to_json;
use crate::DbError;

/// Counts of rows written by [`seed_dataset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub buildings: usize,
    pub restaurants: usize,
}

/// Upsert every building and restaurant from `dataset`.
///
/// Buildings are written first so restaurant links resolve. A restaurant whose
/// building id matches no stored building is written with no link. All
/// upserts run inside a single transaction; if any operation fails the entire
/// batch is rolled back. Re-seeding keeps each restaurant's original `seq`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_dataset(pool: &PgPool, dataset: &Dataset) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for building in &dataset.buildings {
        sqlx::query(
            "INSERT INTO buildings \
                 (osm_id, name, building_type, building_levels, building_material, \
                  building_use, geometry_coordinates) \
             VALUES ($1, $2, $3, $4, $5, $6, $7::JSONB) \
             ON CONFLICT (osm_id) DO UPDATE SET \
                 name                 = EXCLUDED.name, \
                 building_type        = EXCLUDED.building_type, \
                 building_levels      = EXCLUDED.building_levels, \
                 building_material    = EXCLUDED.building_material, \
                 building_use         = EXCLUDED.building_use, \
                 geometry_coordinates = EXCLUDED.geometry_coordinates, \
                 updated_at           = NOW()",
        )
        .bind(building.osm_id.as_str())
        .bind(&building.name)
        .bind(&building.building_type)
        .bind(building.levels)
        .bind(&building.material)
        .bind(&building.building_use)
        .bind(ring_to_json(&building.ring))
        .execute(&mut *tx)
        .await?;

        summary.buildings += 1;
    }

    for restaurant in &dataset.restaurants {
        let rating = Decimal::from_f64_retain(restaurant.rating)
            .unwrap_or_default()
            .round_dp(1);

        sqlx::query(
            "INSERT INTO restaurants \
                 (id, name, address, opening_hours, rating, lat, lng, osm_building_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, \
                     (SELECT osm_id FROM buildings WHERE osm_id = $8)) \
             ON CONFLICT (id) DO UPDATE SET \
                 name            = EXCLUDED.name, \
                 address         = EXCLUDED.address, \
                 opening_hours   = EXCLUDED.opening_hours, \
                 rating          = EXCLUDED.rating, \
                 lat             = EXCLUDED.lat, \
                 lng             = EXCLUDED.lng, \
                 osm_building_id = EXCLUDED.osm_building_id, \
                 updated_at      = NOW()",
        )
        .bind(&restaurant.id)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.opening_hours)
        .bind(rating)
        .bind(restaurant.lat)
        .bind(restaurant.lng)
        .bind(restaurant.osm_building_id.as_ref().map(|id| id.as_str()))
        .execute(&mut *tx)
        .await?;

        summary.restaurants += 1;
    }

    tx.commit().await?;

    tracing::info!(
        buildings = summary.buildings,
        restaurants = summary.restaurants,
        "seeded dataset"
    );

    Ok(summary)
}
