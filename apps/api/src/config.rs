//! Server configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file is read first when present.
//!
//! | Variable                   | Default            |
//! |----------------------------|--------------------|
//! | `SALON_HOST`               | `0.0.0.0`          |
//! | `SALON_PORT`               | `3000`             |
//! | `SALON_DATABASE_PATH`      | `./data/salon.db`  |
//! | `SALON_DB_MAX_CONNECTIONS` | `5`                |
//! | `SALON_STOCK_POLICY`       | `allow_negative`   |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use salon_core::StockPolicy;
use salon_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub db_max_connections: u32,
    pub stock_policy: StockPolicy,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            host: get("SALON_HOST", "0.0.0.0")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALON_HOST".to_string()))?,

            port: get("SALON_PORT", "3000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALON_PORT".to_string()))?,

            database_path: PathBuf::from(get("SALON_DATABASE_PATH", "./data/salon.db")),

            db_max_connections: get("SALON_DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALON_DB_MAX_CONNECTIONS".to_string()))?,

            stock_policy: get("SALON_STOCK_POLICY", "allow_negative")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SALON_STOCK_POLICY".to_string()))?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SALON_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .stock_policy(self.stock_policy)
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
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.database_path, PathBuf::from("./data/salon.db"));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.stock_policy, StockPolicy::AllowNegative);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SALON_HOST", "127.0.0.1"),
            ("SALON_PORT", "8080"),
            ("SALON_STOCK_POLICY", "reject_insufficient"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.stock_policy, StockPolicy::RejectInsufficient);
        assert_eq!(
            config.db_config().stock_policy,
            StockPolicy::RejectInsufficient
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("SALON_PORT", "not-a-port")]),
            Err(ConfigError::InvalidValue(key)) if key == "SALON_PORT"
        ));
        assert!(config_from(&[("SALON_STOCK_POLICY", "maybe")]).is_err());
        assert!(config_from(&[("SALON_DB_MAX_CONNECTIONS", "0")]).is_err());
    }
}
