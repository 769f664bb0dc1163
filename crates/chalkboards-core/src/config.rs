use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::geo::{Coordinates, Radius};
use crate::ConfigError;

/// Load application configuration from environment variables.
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

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_value::<u32>(var, &or_default(var, default))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_value::<usize>(var, &or_default(var, default))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        parse_value::<f64>(var, &or_default(var, default))
    };

    let store_url = require("CHALKBOARDS_STORE_URL")?;
    let store_key = require("CHALKBOARDS_STORE_KEY")?;

    let env = parse_environment(&or_default("CHALKBOARDS_ENV", "development"));

    let bind_addr = parse_value::<SocketAddr>(
        "CHALKBOARDS_BIND_ADDR",
        &or_default("CHALKBOARDS_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("CHALKBOARDS_LOG_LEVEL", "info");
    let categories_path = lookup("CHALKBOARDS_CATEGORIES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let geocoder_url = or_default(
        "CHALKBOARDS_GEOCODER_URL",
        "https://nominatim.openstreetmap.org",
    );

    let request_timeout_secs = parse_u64("CHALKBOARDS_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CHALKBOARDS_USER_AGENT", "chalkboards/0.1 (specials-feed)");
    let fetch_limit = parse_u32("CHALKBOARDS_FETCH_LIMIT", "800")?;
    let fetch_max_retries = parse_u32("CHALKBOARDS_FETCH_MAX_RETRIES", "2")?;
    let fetch_backoff_base_secs = parse_u64("CHALKBOARDS_FETCH_BACKOFF_BASE_SECS", "1")?;
    let refresh_interval_secs = parse_u64("CHALKBOARDS_REFRESH_INTERVAL_SECS", "240")?;
    if refresh_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CHALKBOARDS_REFRESH_INTERVAL_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let lat = parse_f64("CHALKBOARDS_DEFAULT_LAT", "40.88")?;
    let lng = parse_f64("CHALKBOARDS_DEFAULT_LNG", "-74.07")?;
    let default_origin = Coordinates::new(lat, lng).ok_or_else(|| ConfigError::InvalidEnvVar {
        var: "CHALKBOARDS_DEFAULT_LAT".to_string(),
        reason: "default origin must be finite".to_string(),
    })?;
    let default_radius = or_default("CHALKBOARDS_DEFAULT_RADIUS", "10")
        .parse::<Radius>()
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: "CHALKBOARDS_DEFAULT_RADIUS".to_string(),
            reason,
        })?;

    let page_size = parse_usize("CHALKBOARDS_PAGE_SIZE", "10")?;
    let support_email = or_default("CHALKBOARDS_SUPPORT_EMAIL", "chalkboards.app@gmail.com");

    Ok(AppConfig {
        store_url,
        store_key,
        env,
        bind_addr,
        log_level,
        categories_path,
        geocoder_url,
        request_timeout_secs,
        user_agent,
        fetch_limit,
        fetch_max_retries,
        fetch_backoff_base_secs,
        refresh_interval_secs,
        default_origin,
        default_radius,
        page_size,
        support_email,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
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
