//! Persistence keys and flag helpers
//!
//! The board list, the sound catalog, and the "default sounds removed" flag
//! live under three independent keys of the same key-value store.

use soundboard_core::{KeyValueStore, Result};

/// Board list document
pub const BOARDS_KEY: &str = "soundboards";

/// Sound catalog document
pub const CATALOG_KEY: &str = "SOUNDBOARD_SOUNDS_METADATA";

/// Set once every bundled starter sound has been removed by the user
pub const DEFAULT_SOUNDS_REMOVED_KEY: &str = "defaultSoundsRemoved";

/// Read a boolean flag; anything but `"true"` reads as `false`
pub async fn get_flag(store: &dyn KeyValueStore, key: &str) -> Result<bool> {
    Ok(store.get(key).await?.as_deref() == Some("true"))
}

/// Write a boolean flag as `"true"` / `"false"`
pub async fn set_flag(store: &dyn KeyValueStore, key: &str, value: bool) -> Result<()> {
    store.set(key, if value { "true" } else { "false" }).await
}
