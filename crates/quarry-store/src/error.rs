//! Store error types.

use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted data for a dataset could not be decoded.
    ///
    /// [`crate::Store::load`] recovers from this with an empty dataset.
    #[error("dataset '{name}' is corrupt: {source}")]
    Corrupt {
        /// Dataset name
        name: String,
        /// Decode failure
        #[source]
        source: serde_json::Error,
    },

    /// A dataset could not be serialized.
    #[error("failed to serialize dataset '{name}': {source}")]
    Serialize {
        /// Dataset name
        name: String,
        /// Encode failure
        #[source]
        source: serde_json::Error,
    },

    /// Dataset names are restricted to ASCII letters, digits, `_` and `-`.
    #[error("invalid dataset name: {0:?}")]
    InvalidName(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error on the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
