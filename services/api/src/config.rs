//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::FixedOffset;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub jwt_secret: String,
    /// The fixed offset in which session dates and time slots are read.
    pub venue_offset: FixedOffset,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let max_connections_str = var_or("DB_MAX_CONNECTIONS", "5");
        let db_max_connections = max_connections_str
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DB_MAX_CONNECTIONS".to_string(),
                    format!("'{}' is not a positive integer", max_connections_str),
                )
            })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Authentication ---
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("JWT_SECRET".to_string()))?;

        // --- Venue and CORS ---
        let offset_str = var_or("VENUE_UTC_OFFSET", "+00:00");
        let venue_offset = offset_str.parse::<FixedOffset>().map_err(|_| {
            ConfigError::InvalidValue(
                "VENUE_UTC_OFFSET".to_string(),
                format!("'{}' is not an offset like +02:00", offset_str),
            )
        })?;

        let cors_allowed_origin = var_or("CORS_ALLOWED_ORIGIN", "http://localhost:3000");

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            jwt_secret,
            venue_offset,
            cors_allowed_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_fill_everything_but_the_secrets() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/cinema"), ("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.venue_offset.local_minus_utc(), 0);
        assert_eq!(config.cors_allowed_origin, "http://localhost:3000");
    }

    #[test]
    fn missing_required_variables_are_reported() {
        assert!(matches!(
            load(&[("JWT_SECRET", "s3cret")]),
            Err(ConfigError::MissingVar(name)) if name == "DATABASE_URL"
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "")]),
            Err(ConfigError::MissingVar(name)) if name == "JWT_SECRET"
        ));
    }

    #[test]
    fn venue_offset_and_invalid_values() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "k")];

        let mut vars = base.to_vec();
        vars.push(("VENUE_UTC_OFFSET", "+04:00"));
        assert_eq!(load(&vars).unwrap().venue_offset.local_minus_utc(), 4 * 3600);

        let mut vars = base.to_vec();
        vars.push(("VENUE_UTC_OFFSET", "Asia/Tehran"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue(name, _)) if name == "VENUE_UTC_OFFSET"));

        let mut vars = base.to_vec();
        vars.push(("DB_MAX_CONNECTIONS", "0"));
        assert!(load(&vars).is_err());

        let mut vars = base.to_vec();
        vars.push(("BIND_ADDRESS", "nowhere"));
        assert!(load(&vars).is_err());
    }
}
