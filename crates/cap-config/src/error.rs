//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A TOML file or environment variable could not be merged or extracted.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A section required to start the server is empty.
    #[error("Configuration section '{section}' is not configured")]
    NotConfigured { section: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
