//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shopfloor_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a writer waits for the SQLite write lock
    pub db_busy_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            database_path: "./shopfloor.db".to_string(),
            db_max_connections: 5,
            db_busy_timeout_secs: 5,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_port: parse_var("HTTP_PORT", defaults.http_port)?,
            database_path: env::var("SHOPFLOOR_DB_PATH").unwrap_or(defaults.database_path),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_busy_timeout_secs: parse_var("DB_BUSY_TIMEOUT_SECS", defaults.db_busy_timeout_secs)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .busy_timeout(Duration::from_secs(self.db_busy_timeout_secs))
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_path, "./shopfloor.db");
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        let port: u16 = parse_var("SHOPFLOOR_TEST_UNSET_VARIABLE", 9000).unwrap();
        assert_eq!(port, 9000);
    }
}
