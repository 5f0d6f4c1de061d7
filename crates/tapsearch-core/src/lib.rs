//! Domain types and pure search logic shared by the tapsearch service,
//! client, and CLI.

pub mod app_config;
pub mod buildings;
pub mod config;
pub mod dataset;
pub mod geo;
pub mod restaurants;
pub mod search;

use thiserror::Error;

pub use app_config::{AppConfig, ClientConfig, Environment, FallbackPolicy};
pub use buildings::{Building, BuildingFeature, BuildingId, FeatureProperties, PolygonRing};
pub use config::{load_app_config, load_app_config_from_env, load_client_config};
pub use dataset::{load_dataset, Dataset};
pub use geo::{nearest, planar_distance, within_radius, Coordinates, Located, Nearest};
pub use restaurants::Restaurant;
pub use search::{
    NearbyRequest, NearbyRestaurant, OptimizedSearchResponse, RawCoordinates, SearchError,
    SearchMode, SearchResponse,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),
    #[error("invalid rating {0}: must be between 0.0 and 5.0")]
    InvalidRating(f64),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read dataset file {path}: {source}")]
    DatasetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset file {path}: {source}")]
    DatasetParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
}
