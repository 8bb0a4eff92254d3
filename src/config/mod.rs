//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `CATALOG_REFRESH`
//! prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use catalog_refresh::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod circuit_breaker;
mod database;
mod error;
mod paapi;
mod refresh;
mod server;

pub use circuit_breaker::CircuitBreakerSettings;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use paapi::PaapiConfig;
pub use refresh::RefreshConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration. Optional so the process can start and report
    /// a configuration error instead of crashing.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Product Advertising API credentials and endpoint
    #[serde(default)]
    pub paapi: PaapiConfig,

    /// Refresh run tunables
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Upstream circuit breaker thresholds
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CATALOG_REFRESH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CATALOG_REFRESH__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CATALOG_REFRESH__PAAPI__PARTNER_TAG=store-20` -> `paapi.partner_tag`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CATALOG_REFRESH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// A missing database section is not an error here; it is reported per
    /// trigger request instead.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.paapi.validate()?;
        self.refresh.validate()?;
        self.circuit_breaker.validate()?;
        Ok(())
    }
}
