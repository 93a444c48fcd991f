/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted document was written by a newer schema
    #[error("Unsupported schema version {found} for {document} (supported up to {supported})")]
    UnsupportedSchema {
        document: &'static str,
        found: u32,
        supported: u32,
    },

    /// Persisted document has an unrecognized shape
    #[error("Malformed {document}: {reason}")]
    Malformed {
        document: &'static str,
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for soundboard_core::SoundboardError {
    fn from(err: StorageError) -> Self {
        soundboard_core::SoundboardError::storage(err.to_string())
    }
}
