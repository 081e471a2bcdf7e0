//! # cap-config
//!
//! Layered configuration loading for captrack using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CAPTRACK_*` prefix, `__` as separator)
//! 2. An explicit file passed with `captrackd --config`
//! 3. Project-level `.captrack/config.toml`
//! 4. User-level `~/.config/captrack/config.toml`
//! 5. Built-in defaults
//!
//! Figment maps `CAPTRACK_SERVER__BIND_ADDR` -> `server.bind_addr`,
//! `CAPTRACK_DATABASE__PATH` -> `database.path`, and so on.
//!
//! ```no_run
//! use cap_config::CapConfig;
//!
//! let config = CapConfig::load_with_dotenv(None).expect("config");
//! println!("listening on {}", config.server.bind_addr);
//! ```

mod database;
mod error;
mod log;
mod server;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use log::LogConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "CAPTRACK_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CapConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl CapConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a required value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `extra` above the discovered TOML files.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a required value is invalid.
    pub fn load_from(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_with(extra).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a required value is invalid.
    pub fn load_with_dotenv(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_from(extra)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_with(None)
    }

    /// Build the figment provider chain with an optional explicit config file.
    #[must_use]
    pub fn figment_with(extra: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".captrack/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Path to the user-global config file.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("captrack").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.database.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "database".to_string(),
            });
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn figment_builds_without_files() {
        let config: CapConfig = CapConfig::figment().extract().expect("should extract defaults");
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.database.path, ".captrack/captrack.db");
    }

    #[test]
    fn global_path_is_namespaced() {
        if let Some(path) = CapConfig::global_config_path() {
            assert!(path.ends_with("captrack/config.toml"));
        }
    }
}
