//! Soundboard Core
//!
//! Platform-agnostic domain types, collaborator traits, and error handling for
//! the soundboard persistence and lifecycle libraries.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Board`, `SoundEntry`, `SoundCatalogEntry` and their ids
//! - **Collaborator Traits**: `KeyValueStore`, `SoundFetcher`
//! - **Error Handling**: Unified `SoundboardError` and `Result` types
//!
//! It performs no I/O of its own; storage, files, and lifecycle management live
//! in `soundboard-storage`, `soundboard-files`, and `soundboard-state`.
//!
//! # Example
//!
//! ```rust
//! use soundboard_core::types::{Board, BoardId, SoundEntry, SoundId};
//!
//! let mut board = Board::new(BoardId::new(7), "Drums");
//! board.sounds.push(SoundEntry::new(SoundId::new(1), "kick.wav", "file:///tmp/kick.wav"));
//!
//! assert_eq!(board.sounds[0].display_title(), "kick.wav");
//! assert!(board.has_unique_sids());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;
pub mod uri;

// Re-export commonly used types
pub use error::{Result, SoundboardError};
pub use traits::{KeyValueStore, SoundFetcher};

pub use types::{
    Board, BoardId, CatalogId, CatalogPage, SoundCatalogEntry, SoundEntry, SoundId,
    UpdateSoundEntry,
};
