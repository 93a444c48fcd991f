#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use soundboard_core::types::{Board, SoundEntry, SoundId};
use soundboard_core::{uri, KeyValueStore, Result, SoundFetcher, SoundboardError};
use soundboard_files::SoundFileStore;
use soundboard_state::{BoardEvent, BoardManager, ManagerConfig};
use soundboard_storage::{documents, keys, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;

mock! {
    pub Fetcher {}

    #[async_trait]
    impl SoundFetcher for Fetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
    }
}

/// Memory store whose writes can be switched off
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FailingStore {
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SoundboardError::storage("write rejected"));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}

/// A manager over a temp directory and an in-memory store
pub struct Harness {
    pub manager: Arc<BoardManager>,
    pub store: Arc<FailingStore>,
    pub files: Arc<SoundFileStore>,
    pub source_dir: PathBuf,
    _temp_dir: TempDir,
}

impl Harness {
    /// No starter sounds, fast retries, fetcher that must not be called
    pub fn new() -> Self {
        Self::with(fast_config(), MockFetcher::new())
    }

    pub fn with(config: ManagerConfig, fetcher: MockFetcher) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source_dir = temp_dir.path().join("picked");
        std::fs::create_dir_all(&source_dir).expect("Failed to create source dir");

        let store = Arc::new(FailingStore::default());
        let files = Arc::new(SoundFileStore::new(
            temp_dir.path().join("sounds"),
            store.clone(),
        ));
        let manager = Arc::new(BoardManager::new(
            config,
            store.clone(),
            files.clone(),
            Arc::new(fetcher),
        ));

        Self {
            manager,
            store,
            files,
            source_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Harness already loaded (default board seeded)
    pub async fn loaded() -> Self {
        let harness = Self::new();
        harness.manager.load().await.expect("load failed");
        harness
    }

    /// Write a file outside managed storage and return its `file://` URI
    pub fn source_file(&self, name: &str, content: &[u8]) -> String {
        let path = self.source_dir.join(name);
        std::fs::write(&path, content).expect("Failed to write source file");
        uri::from_local_path(&path)
    }

    /// Write a file directly into managed storage and return its URI
    pub fn managed_file(&self, name: &str, content: &[u8]) -> String {
        std::fs::create_dir_all(self.files.directory()).expect("Failed to create sound dir");
        let path = self.files.sound_file_path(name);
        std::fs::write(&path, content).expect("Failed to write managed file");
        uri::from_local_path(&path)
    }

    /// Store a raw board list document before loading
    pub async fn store_raw_boards(&self, raw: &str) {
        self.store.set(keys::BOARDS_KEY, raw).await.unwrap();
    }

    pub async fn store_boards(&self, boards: &[Board]) {
        let raw = documents::encode_boards(boards).unwrap();
        self.store_raw_boards(&raw).await;
    }

    /// Board list as currently persisted
    pub async fn persisted_boards(&self) -> Vec<Board> {
        let raw = self
            .store
            .get(keys::BOARDS_KEY)
            .await
            .unwrap()
            .expect("no persisted boards");
        documents::decode_boards(&raw).unwrap().value
    }

    pub async fn starter_flag(&self) -> bool {
        keys::get_flag(self.store.as_ref(), keys::DEFAULT_SOUNDS_REMOVED_KEY)
            .await
            .unwrap()
    }
}

pub fn fast_config() -> ManagerConfig {
    ManagerConfig {
        persist_retries: 1,
        persist_backoff_ms: 1,
        ..ManagerConfig::without_starter_sounds()
    }
}

pub fn sound(sid: i64, name: &str, location: &str) -> SoundEntry {
    SoundEntry::new(SoundId::new(sid), name, location)
}

pub fn local_path(location: &str) -> PathBuf {
    uri::to_local_path(location).expect("not a local uri")
}

/// Events received so far, without waiting
pub fn drain(receiver: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
