use thiserror::Error;

/// Errors produced by the local storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error (includes quota/disk-full conditions).
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored value could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Creating the storage directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;
