use std::fmt::Display;
use std::str::FromStr;

use crate::app_config::{AppConfig, ClientConfig, Environment, FallbackPolicy};
use crate::search::SearchMode;
use crate::ConfigError;

/// Load Query Service configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load Query Service configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load map client configuration from the process environment (and `.env`).
///
/// Every client setting has a default, so this only fails on malformed values.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a value cannot be parsed.
pub fn load_client_config() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_client_config(|key| std::env::var(key))
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Result<String, std::env::VarError>,
    var: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build service configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = lookup("DATABASE_URL")
        .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

    let env = parse_environment(&or_default("TAPSEARCH_ENV", "development"));
    let bind_addr: SocketAddr = parse_var(&lookup, "TAPSEARCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("TAPSEARCH_LOG_LEVEL", "info");
    let dataset_path = PathBuf::from(or_default(
        "TAPSEARCH_DATASET_PATH",
        "./config/dataset.yaml",
    ));

    let db_max_connections = parse_var(&lookup, "TAPSEARCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_var(&lookup, "TAPSEARCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_var(&lookup, "TAPSEARCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let rate_limit_per_minute = parse_var(&lookup, "TAPSEARCH_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        dataset_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_per_minute,
    })
}

fn build_client_config<F>(lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = ClientConfig::default();

    let api_base_url = lookup("TAPSEARCH_API_BASE_URL").unwrap_or(defaults.api_base_url);
    let request_timeout_secs: u64 = parse_var(&lookup, "TAPSEARCH_CLIENT_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TAPSEARCH_CLIENT_TIMEOUT_SECS".to_string(),
            reason: "timeout must be at least one second".to_string(),
        });
    }
    let max_retries = parse_var(&lookup, "TAPSEARCH_CLIENT_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_var(&lookup, "TAPSEARCH_CLIENT_RETRY_BACKOFF_MS", "250")?;
    let fallback: FallbackPolicy = parse_var(&lookup, "TAPSEARCH_CLIENT_FALLBACK", "fail")?;
    let mode: SearchMode = parse_var(&lookup, "TAPSEARCH_CLIENT_MODE", "optimized")?;

    Ok(ClientConfig {
        api_base_url,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        fallback,
        mode,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
