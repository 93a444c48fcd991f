/// Core error types for the soundboard
use thiserror::Error;

use crate::types::{BoardId, SoundId};

/// Result type alias using `SoundboardError`
pub type Result<T> = std::result::Result<T, SoundboardError>;

/// Core error type for the soundboard
#[derive(Error, Debug)]
pub enum SoundboardError {
    /// The managed sound directory cannot be created or accessed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The source of a sound (file, URI, payload) could not be read
    #[error("Source unreadable: {uri}: {reason}")]
    SourceUnreadable { uri: String, reason: String },

    /// Writing a sound into managed storage failed
    #[error("Copy failed: {destination}: {reason}")]
    CopyFailed { destination: String, reason: String },

    /// The key-value store rejected a write after all retries
    #[error("Failed to persist {key}: {reason}")]
    PersistenceWriteFailure { key: String, reason: String },

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Board not found
    #[error("Board not found: {0}")]
    BoardNotFound(BoardId),

    /// Sound entry not found on the current board
    #[error("Sound not found: {0}")]
    SoundNotFound(SoundId),

    /// A sound with this sid already exists on the board
    #[error("Duplicate sound id {sid} on board {board_id}")]
    DuplicateSound { board_id: BoardId, sid: SoundId },

    /// The board state has not finished loading
    #[error("Board state not ready")]
    NotReady,

    /// Downloading a remote sound failed
    #[error("Fetch failed: {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl SoundboardError {
    /// Create a storage unavailable error
    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a source unreadable error
    pub fn source_unreadable(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnreadable {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a copy failed error
    pub fn copy_failed(destination: impl Into<String>, reason: impl ToString) -> Self {
        Self::CopyFailed {
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error came from ingesting a sound (shown to the user as an alert)
    pub fn is_ingest_failure(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::SourceUnreadable { .. } | Self::CopyFailed { .. }
        )
    }
}
