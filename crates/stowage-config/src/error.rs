//! Error types for configuration operations.

use thiserror::Error;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The merged collection configuration has no usable name.
    #[error("collection {logical_name:?} has no resolvable name")]
    MissingName { logical_name: String },

    /// A configuration value is out of range or malformed.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// I/O error while reading a configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
