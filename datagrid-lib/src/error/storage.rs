//! Settings storage error types

/// Errors raised by a settings backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend is not usable (disabled, over quota, closed).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
