//! Configuration Error Types

use thiserror::Error;

/// Errors raised while constructing or loading engine configuration.
///
/// The per-alert path is infallible; everything here surfaces at
/// startup, before the first alert is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is missing or empty
    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    /// A timeout is outside the allowed range
    #[error("Invalid timeout: {field} must be greater than zero")]
    InvalidTimeout { field: &'static str },

    /// Underlying configuration source failed to load or deserialize
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
