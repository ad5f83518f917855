//! Error types for the SQLite snapshot store

use thiserror::Error;

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SqliteError>;

/// Errors that can occur while saving or loading snapshots
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Database connection or query error
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
