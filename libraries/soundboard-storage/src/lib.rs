//! Soundboard Storage
//!
//! Key-value persistence for the soundboard.
//!
//! # Architecture
//!
//! - **Stores**: [`SqliteStore`] (durable, one `kv_store` table) and
//!   [`MemoryStore`] (ephemeral), both implementing
//!   [`soundboard_core::KeyValueStore`]
//! - **Keys**: the fixed keys for boards, catalog, and flags ([`keys`])
//! - **Documents**: versioned JSON encoding with load-time migration
//!   ([`documents`])
//!
//! # Example
//!
//! ```rust,no_run
//! use soundboard_storage::{create_pool, run_migrations, SqliteStore, keys};
//! use soundboard_core::KeyValueStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://soundboard.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteStore::new(pool);
//! let boards = store.get(keys::BOARDS_KEY).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

pub mod documents;
pub mod keys;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the first read.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://soundboard.db>`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
