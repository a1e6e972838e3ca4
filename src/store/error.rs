//! Error types for local persistence.

use thiserror::Error;

/// Errors that can occur while persisting or restoring local state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The write would push the store past its configured size.
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        /// Total bytes after the write.
        needed: usize,
        /// Configured limit.
        quota: usize,
    },

    /// A lock guarding the connection was poisoned.
    #[error("store lock poisoned")]
    Poisoned,

    /// An import artifact could not be read.
    #[error("import failed: {0}")]
    Import(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
