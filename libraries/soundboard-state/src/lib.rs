//! Soundboard State
//!
//! The board manager: owns the board list and current selection, loads and
//! repairs persisted boards, seeds the default board, and exposes the mutation
//! API the UI calls.
//!
//! # Architecture
//!
//! - **Manager**: [`BoardManager`], one per session, driven through
//!   `Uninitialized -> Loading -> (SeedingDefault ->) Ready`
//! - **Recovery**: batched validation that relinks or drops missing sounds
//!   ([`recovery`])
//! - **Events**: typed broadcast notifications ([`BoardEvent`])
//!
//! # Example
//!
//! ```rust,no_run
//! use soundboard_files::{HttpSoundFetcher, SoundFileStore};
//! use soundboard_state::{BoardManager, ManagerConfig};
//! use soundboard_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> soundboard_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let files = Arc::new(SoundFileStore::new("./data/sounds", store.clone()));
//! let manager = BoardManager::new(
//!     ManagerConfig::default(),
//!     store,
//!     files,
//!     Arc::new(HttpSoundFetcher::new()?),
//! );
//!
//! manager.load().await?;
//! let board = manager.create_board("Drums").await?;
//! assert_eq!(manager.current_board().map(|b| b.id), Some(board.id));
//! # Ok(())
//! # }
//! ```

mod config;
mod events;
mod manager;
mod persistence;
mod seeding;
mod state;

pub mod recovery;

pub use config::{default_starter_sounds, ManagerConfig, StarterSound};
pub use events::{BoardEvent, EventBus};
pub use manager::BoardManager;
pub use recovery::RecoveryReport;
pub use seeding::STARTER_CATEGORY;
pub use state::LifecycleState;
