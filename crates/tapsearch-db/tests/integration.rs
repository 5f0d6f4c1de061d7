//! Offline unit tests for tapsearch-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Utc;
use rust_decimal::Decimal;
use tapsearch_core::{AppConfig, Environment};
use tapsearch_db::{BuildingRow, DbError, PoolConfig, RestaurantRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        dataset_path: PathBuf::from("./config/dataset.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        rate_limit_per_minute: 120,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn restaurant_row_without_building_maps_to_unlinked_restaurant() {
    let row = RestaurantRow {
        seq: 7,
        id: "rest_007".to_string(),
        name: "Corner Cafe".to_string(),
        address: "7-7 Ginza".to_string(),
        opening_hours: "08:00-18:00".to_string(),
        rating: Decimal::new(38, 1),
        lat: 35.6717,
        lng: 139.7650,
        osm_building_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let restaurant = row.into_restaurant();
    assert_eq!(restaurant.id, "rest_007");
    assert!(restaurant.osm_building_id.is_none());
    assert!((restaurant.rating - 3.8).abs() < 1e-9);
}

#[test]
fn building_row_with_bad_geometry_reports_its_id() {
    let row = BuildingRow {
        osm_id: "way/999".to_string(),
        name: None,
        building_type: None,
        building_levels: None,
        building_material: None,
        building_use: None,
        geometry_coordinates: serde_json::json!([[[0.0, 0.0]]]),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let err = row.into_building().unwrap_err();
    assert!(
        matches!(err, DbError::CorruptGeometry { ref osm_id, .. } if osm_id == "way/999"),
        "got: {err:?}"
    );
}
