//! Core error types for Quarry.
//!
//! Subsystem crates define their own error enums; this module holds the
//! configuration error and the shared validation error used by the newtypes
//! in [`crate::types`].

use thiserror::Error;

/// Error raised when a shared type is built from an invalid value.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// Identifier or value rejected by its constructor
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
///
/// These are fatal at startup: a process must not start harvesting with a
/// configuration it could not read.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No home directory to place the config file in
    #[error("no config directory available for this user")]
    NoConfigDir,

    /// File contents are not valid TOML
    #[error("config file is not valid TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Config could not be serialized for saving
    #[error("config could not be written as TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Reading or writing the config file failed
    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result of building a shared type.
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Result of loading, validating or saving the configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
