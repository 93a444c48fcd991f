/// Collaborator traits for the soundboard
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Key-value persistence
///
/// Implementers store opaque string values under fixed keys. The board list,
/// the sound catalog, and the "default sounds removed" flag each live under
/// their own key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key` (no-op if absent)
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Remote sound download
///
/// Used to fetch the bundled starter sounds when a default board is seeded.
#[async_trait]
pub trait SoundFetcher: Send + Sync {
    /// Download `url` into the file at `dest`
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}
