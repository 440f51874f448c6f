//! # prism-config
//!
//! Layered configuration loading for Prism using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PRISM_*` prefix, `__` as separator)
//! 2. Project-level `.prism/config.toml`
//! 3. User-level `~/.config/prism/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PRISM_DATABASE__PATH` -> `database.path`,
//! `PRISM_AGGREGATE__MAX_ATTEMPTS` -> `aggregate.max_attempts`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use prism_config::PrismConfig;
//!
//! let config = PrismConfig::load_with_dotenv().expect("config");
//! println!("database at {}", config.database.path);
//! ```

mod aggregate;
mod database;
mod error;
mod query;

pub use aggregate::AggregateConfig;
pub use database::{DEFAULT_DB_PATH, DatabaseConfig, IN_MEMORY};
pub use error::ConfigError;
pub use query::QueryConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrismConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl PrismConfig {
    /// Load configuration from TOML files and environment variables, then
    /// validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if extraction fails, or
    /// `ConfigError::InvalidValue` if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".prism/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("PRISM_").split("__"))
    }

    /// Reject values the store cannot operate with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::invalid("database.path", "must not be empty"));
        }
        if self.aggregate.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "aggregate.max_attempts",
                "must be at least 1",
            ));
        }
        if self.aggregate.base_delay_ms > self.aggregate.max_delay_ms {
            return Err(ConfigError::invalid(
                "aggregate.base_delay_ms",
                format!(
                    "{} exceeds aggregate.max_delay_ms ({})",
                    self.aggregate.base_delay_ms, self.aggregate.max_delay_ms
                ),
            ));
        }
        if self.query.max_page_size == 0 {
            return Err(ConfigError::invalid(
                "query.max_page_size",
                "must be at least 1",
            ));
        }
        if self.query.default_page_size == 0
            || self.query.default_page_size > self.query.max_page_size
        {
            return Err(ConfigError::invalid(
                "query.default_page_size",
                format!("must be between 1 and {}", self.query.max_page_size),
            ));
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prism").join("config.toml"))
    }
}
