use soundboard_files::SoundFileStore;
use soundboard_storage::MemoryStore;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Managed directory and catalog in a temp dir, with a source folder beside it
pub struct TestFiles {
    pub store: SoundFileStore,
    pub kv: Arc<MemoryStore>,
    pub source_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestFiles {
    pub fn new() -> Self {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .try_init();
        });

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source_dir = temp_dir.path().join("picked");
        std::fs::create_dir_all(&source_dir).expect("Failed to create source dir");

        let kv = Arc::new(MemoryStore::new());
        let store = SoundFileStore::new(temp_dir.path().join("sounds"), kv.clone());

        Self {
            store,
            kv,
            source_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Write a source file outside the managed directory
    pub fn create_source(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.source_dir.join(name);
        std::fs::write(&path, content).expect("Failed to write source file");
        path
    }
}

pub fn file_uri(path: &Path) -> String {
    soundboard_core::uri::from_local_path(path)
}
