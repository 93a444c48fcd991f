//! Board list persistence with retry
//!
//! Writes go through [`BoardPersistence::save`], which retries with
//! exponential backoff before giving up with `PersistenceWriteFailure`.

use soundboard_core::types::Board;
use soundboard_core::{KeyValueStore, Result, SoundboardError};
use soundboard_storage::documents::{self, Decoded};
use soundboard_storage::keys;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub(crate) struct BoardPersistence {
    store: Arc<dyn KeyValueStore>,
    retries: u32,
    backoff: Duration,
}

impl BoardPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>, retries: u32, backoff: Duration) -> Self {
        Self {
            store,
            retries,
            backoff,
        }
    }

    /// Read and decode the stored board list, migrating older schemas
    pub async fn load(&self) -> Result<Option<Decoded<Vec<Board>>>> {
        let Some(raw) = self.store.get(keys::BOARDS_KEY).await? else {
            debug!("No stored board list");
            return Ok(None);
        };

        let decoded = documents::decode_boards(&raw)?;
        if let Some(from) = decoded.migrated_from {
            warn!(from, "Board list stored in an older schema, migrating");
        }
        Ok(Some(decoded))
    }

    /// Persist the full board list; placeholder entries are never written
    pub async fn save(&self, boards: &[Board]) -> Result<()> {
        let encoded = documents::encode_boards(&persistable(boards))?;
        self.write_with_retry(keys::BOARDS_KEY, &encoded).await
    }

    pub async fn default_sounds_removed(&self) -> Result<bool> {
        keys::get_flag(self.store.as_ref(), keys::DEFAULT_SOUNDS_REMOVED_KEY).await
    }

    pub async fn set_default_sounds_removed(&self) -> Result<()> {
        self.write_with_retry(keys::DEFAULT_SOUNDS_REMOVED_KEY, "true")
            .await
    }

    async fn write_with_retry(&self, key: &str, value: &str) -> Result<()> {
        let mut delay = self.backoff;
        let mut attempt: u32 = 0;

        loop {
            match self.store.set(key, value).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        key,
                        attempt,
                        retries = self.retries,
                        error = %err,
                        "Persist failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(err) => {
                    error!(key, attempts = attempt + 1, error = %err, "Persist failed");
                    return Err(SoundboardError::PersistenceWriteFailure {
                        key: key.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
}

/// Copy of `boards` without in-flight placeholders
pub(crate) fn persistable(boards: &[Board]) -> Vec<Board> {
    boards
        .iter()
        .map(|board| Board {
            sounds: board
                .sounds
                .iter()
                .filter(|sound| !sound.processing)
                .cloned()
                .collect(),
            ..board.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use soundboard_core::types::{BoardId, SoundEntry, SoundId};
    use soundboard_storage::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` writes
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicU32,
        attempts: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures: AtomicU32::new(failures),
                attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(SoundboardError::storage("disk full"));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
    }

    fn boards() -> Vec<Board> {
        let mut board = Board::new(BoardId::new(1), "Drums");
        board
            .sounds
            .push(SoundEntry::new(SoundId::new(1), "kick.wav", "/s/kick.wav"));
        vec![board]
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_retries_until_success() {
        let store = Arc::new(FlakyStore::new(2));
        let persistence = BoardPersistence::new(store.clone(), 3, Duration::from_millis(50));

        persistence.save(&boards()).await.unwrap();

        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
        let loaded = persistence.load().await.unwrap().unwrap();
        assert_eq!(loaded.value, boards());
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_gives_up_after_retries() {
        let store = Arc::new(FlakyStore::new(10));
        let persistence = BoardPersistence::new(store.clone(), 2, Duration::from_millis(50));

        let err = persistence.save(&boards()).await.unwrap_err();

        assert!(matches!(
            err,
            SoundboardError::PersistenceWriteFailure { ref key, .. } if key == keys::BOARDS_KEY
        ));
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
        assert!(persistence.load().await.unwrap().is_none());
    }

    #[test]
    fn test_persistable_drops_placeholders() {
        let mut boards = boards();
        let mut placeholder = SoundEntry::new(SoundId::new(2), "snare.wav", "/picked/snare.wav");
        placeholder.processing = true;
        boards[0].sounds.push(placeholder);

        let kept = persistable(&boards);
        assert_eq!(kept[0].sounds.len(), 1);
        assert_eq!(kept[0].sounds[0].sid, SoundId::new(1));
    }
}
