//! Sound File Store
//!
//! Owns the managed directory where imported and recorded audio lives, plus
//! the catalog describing every file copied into it. Knows nothing about
//! boards.

use crate::naming;
use base64::Engine as _;
use soundboard_core::types::{CatalogId, CatalogPage, SoundCatalogEntry};
use soundboard_core::{uri, KeyValueStore, Result, SoundboardError};
use soundboard_storage::{documents, keys};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the bytes of a new sound come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// Copy from a local file (`file://` URI or plain path)
    Uri(String),
    /// Write a base64-encoded payload (e.g. a fresh recording)
    Base64(String),
}

impl SoundSource {
    fn uri(&self) -> Option<&str> {
        match self {
            Self::Uri(uri) => Some(uri),
            Self::Base64(_) => None,
        }
    }
}

/// Managed sound directory plus its catalog
pub struct SoundFileStore {
    directory: PathBuf,
    store: Arc<dyn KeyValueStore>,
    /// Serializes catalog read-modify-write cycles
    catalog_lock: Mutex<()>,
}

impl SoundFileStore {
    /// Create a store rooted at `directory`
    ///
    /// Relative directories are resolved against the current working directory
    /// so that managed URIs are always absolute.
    pub fn new(directory: impl Into<PathBuf>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            directory: absolutize(directory.into()),
            store,
            catalog_lock: Mutex::new(()),
        }
    }

    /// The managed directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of `file_name` inside the managed directory
    pub fn sound_file_path(&self, file_name: &str) -> PathBuf {
        let name = uri::file_name(file_name).unwrap_or(file_name);
        self.directory.join(name)
    }

    /// Whether `uri` points inside the managed directory
    pub fn is_managed(&self, location: &str) -> bool {
        uri::to_local_path(location)
            .map(absolutize)
            .is_some_and(|path| path.starts_with(&self.directory))
    }

    /// Idempotently create the managed directory
    pub async fn ensure_directory_exists(&self) -> Result<&Path> {
        if let Err(err) = fs::create_dir_all(&self.directory).await {
            // Another caller may have created it in the meantime
            if !fs::metadata(&self.directory)
                .await
                .is_ok_and(|meta| meta.is_dir())
            {
                return Err(SoundboardError::storage_unavailable(format!(
                    "cannot create {}: {}",
                    self.directory.display(),
                    err
                )));
            }
        }

        match fs::metadata(&self.directory).await {
            Ok(meta) if meta.is_dir() => Ok(&self.directory),
            Ok(_) => Err(SoundboardError::storage_unavailable(format!(
                "{} is not a directory",
                self.directory.display()
            ))),
            Err(err) => Err(SoundboardError::storage_unavailable(format!(
                "cannot access {}: {}",
                self.directory.display(),
                err
            ))),
        }
    }

    /// Copy (or write) a sound into managed storage and record it in the catalog
    ///
    /// On any failure the partially written file is removed and the catalog is
    /// left untouched.
    pub async fn add_sound(
        &self,
        source: SoundSource,
        display_name: &str,
        category: &str,
    ) -> Result<SoundCatalogEntry> {
        self.ensure_directory_exists().await?;

        let _guard = self.catalog_lock.lock().await;
        let mut catalog = self.load_catalog().await?;

        let id = unique_catalog_id(&catalog);
        let file_name = naming::generate_file_name(display_name, source.uri(), id.as_str());
        let destination = self.directory.join(&file_name);

        let written = match &source {
            SoundSource::Uri(location) => copy_from_uri(location, &destination).await,
            SoundSource::Base64(payload) => write_base64(payload, &destination).await,
        };

        let bytes = match written {
            Ok(bytes) => bytes,
            Err(err) => {
                remove_partial(&destination).await;
                return Err(err);
            }
        };

        let entry = SoundCatalogEntry {
            id,
            name: display_name.to_string(),
            uri: uri::from_local_path(&destination),
            category: category.to_string(),
            date_added: chrono::Utc::now(),
        };

        catalog.push(entry.clone());
        if let Err(err) = self.save_catalog(&catalog).await {
            remove_partial(&destination).await;
            return Err(err);
        }

        info!(
            catalog_id = %entry.id,
            name = %entry.name,
            bytes,
            dest = %destination.display(),
            "Added sound to managed storage"
        );

        Ok(entry)
    }

    /// Record a file that already lives in the managed directory
    ///
    /// Used for starter sounds downloaded straight into place.
    pub async fn register_managed_file(
        &self,
        path: &Path,
        display_name: &str,
        category: &str,
    ) -> Result<SoundCatalogEntry> {
        let location = uri::from_local_path(path);
        if !self.is_managed(&location) {
            return Err(SoundboardError::invalid_input(format!(
                "{} is outside the managed directory",
                path.display()
            )));
        }

        let _guard = self.catalog_lock.lock().await;
        let mut catalog = self.load_catalog().await?;

        if let Some(existing) = catalog.iter().find(|entry| entry.uri == location) {
            return Ok(existing.clone());
        }

        let entry = SoundCatalogEntry {
            id: unique_catalog_id(&catalog),
            name: display_name.to_string(),
            uri: location,
            category: category.to_string(),
            date_added: chrono::Utc::now(),
        };

        catalog.push(entry.clone());
        self.save_catalog(&catalog).await?;

        Ok(entry)
    }

    /// Whether the file at `location` exists and is non-empty
    ///
    /// Never fails; filesystem errors count as invalid.
    pub async fn validate_sound(&self, location: &str) -> bool {
        validate_sound(location).await
    }

    /// Remove a catalog entry and, best-effort, its backing file
    ///
    /// Returns whether an entry was removed. A file that cannot be deleted is
    /// logged; the catalog is the authority.
    pub async fn remove_sound(&self, id: &CatalogId) -> Result<bool> {
        let _guard = self.catalog_lock.lock().await;
        let mut catalog = self.load_catalog().await?;

        let Some(position) = catalog.iter().position(|entry| &entry.id == id) else {
            debug!(catalog_id = %id, "No catalog entry to remove");
            return Ok(false);
        };

        let entry = catalog.remove(position);
        self.delete_file(&entry.uri).await;
        self.save_catalog(&catalog).await?;

        info!(catalog_id = %id, uri = %entry.uri, "Removed sound from catalog");
        Ok(true)
    }

    /// Best-effort delete of a managed file; external locations are left alone
    ///
    /// Returns whether a file was deleted.
    pub async fn delete_file(&self, location: &str) -> bool {
        if !self.is_managed(location) {
            debug!(uri = %location, "Not deleting file outside managed directory");
            return false;
        }

        let Some(path) = uri::to_local_path(location) else {
            return false;
        };

        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Could not delete sound file");
                false
            }
        }
    }

    /// The full catalog in insertion order
    pub async fn get_sounds_metadata(&self) -> Result<Vec<SoundCatalogEntry>> {
        self.load_catalog().await
    }

    /// One page of the catalog (1-based), in insertion order
    pub async fn get_sounds_metadata_paginated(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<CatalogPage> {
        let catalog = self.load_catalog().await?;
        Ok(CatalogPage::slice(&catalog, page, limit))
    }

    /// Replace the catalog
    pub async fn save_sounds_metadata(&self, entries: &[SoundCatalogEntry]) -> Result<()> {
        let _guard = self.catalog_lock.lock().await;
        self.save_catalog(entries).await
    }

    /// Add `entry` to the catalog unless an entry with its id is already there
    ///
    /// Returns whether the catalog changed.
    pub async fn ensure_catalog_entry(&self, entry: &SoundCatalogEntry) -> Result<bool> {
        let _guard = self.catalog_lock.lock().await;
        let mut catalog = self.load_catalog().await?;

        if catalog.iter().any(|existing| existing.id == entry.id) {
            return Ok(false);
        }

        catalog.push(entry.clone());
        self.save_catalog(&catalog).await?;
        Ok(true)
    }

    /// Catalog entry whose file lives at `location`
    pub async fn find_by_uri(&self, location: &str) -> Result<Option<SoundCatalogEntry>> {
        let catalog = self.load_catalog().await?;
        Ok(catalog.into_iter().find(|entry| entry.uri == location))
    }

    async fn load_catalog(&self) -> Result<Vec<SoundCatalogEntry>> {
        match self.store.get(keys::CATALOG_KEY).await? {
            Some(raw) => Ok(documents::decode_catalog(&raw)?.value),
            None => Ok(Vec::new()),
        }
    }

    async fn save_catalog(&self, entries: &[SoundCatalogEntry]) -> Result<()> {
        let encoded = documents::encode_catalog(entries)?;
        self.store.set(keys::CATALOG_KEY, &encoded).await
    }
}

/// Whether the file at `location` exists and is non-empty
///
/// Never fails; filesystem errors and non-local locations count as invalid.
pub async fn validate_sound(location: &str) -> bool {
    let Some(path) = uri::to_local_path(location) else {
        debug!(uri = %location, "Sound location is not a local file");
        return false;
    };

    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => true,
        Ok(meta) if meta.is_file() => {
            debug!(uri = %location, "Sound file exists but has zero size");
            false
        }
        Ok(_) => {
            debug!(uri = %location, "Sound location is not a regular file");
            false
        }
        Err(err) => {
            debug!(uri = %location, error = %err, "Sound file not found");
            false
        }
    }
}

async fn copy_from_uri(location: &str, destination: &Path) -> Result<u64> {
    let source_path = uri::to_local_path(location)
        .ok_or_else(|| SoundboardError::source_unreadable(location, "not a local file"))?;

    let mut source = File::open(&source_path)
        .await
        .map_err(|err| SoundboardError::source_unreadable(location, err))?;

    let meta = source
        .metadata()
        .await
        .map_err(|err| SoundboardError::source_unreadable(location, err))?;
    if !meta.is_file() {
        return Err(SoundboardError::source_unreadable(location, "not a regular file"));
    }
    if meta.len() == 0 {
        return Err(SoundboardError::source_unreadable(location, "file is empty"));
    }

    let dest_display = destination.display().to_string();
    let mut dest = File::create(destination)
        .await
        .map_err(|err| SoundboardError::copy_failed(&dest_display, err))?;

    let bytes = tokio::io::copy(&mut source, &mut dest)
        .await
        .map_err(|err| SoundboardError::copy_failed(&dest_display, err))?;

    dest.flush()
        .await
        .map_err(|err| SoundboardError::copy_failed(&dest_display, err))?;

    Ok(bytes)
}

async fn write_base64(payload: &str, destination: &Path) -> Result<u64> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| SoundboardError::source_unreadable("base64 payload", err))?;

    if bytes.is_empty() {
        return Err(SoundboardError::source_unreadable(
            "base64 payload",
            "payload is empty",
        ));
    }

    fs::write(destination, &bytes)
        .await
        .map_err(|err| SoundboardError::copy_failed(destination.display().to_string(), err))?;

    Ok(bytes.len() as u64)
}

async fn remove_partial(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "Could not remove partial file");
        }
    }
}

fn unique_catalog_id(catalog: &[SoundCatalogEntry]) -> CatalogId {
    let mut id = CatalogId::generate();
    let mut bump: u32 = 0;
    while catalog.iter().any(|entry| entry.id == id) {
        bump += 1;
        id = CatalogId::new(format!("{}-{}", CatalogId::generate(), bump));
    }
    id
}

/// Absolute, lexically normalized form of `path`
fn absolutize(path: PathBuf) -> PathBuf {
    let path = if path.is_absolute() {
        path
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path,
        }
    };
    uri::normalize_path(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundboard_storage::MemoryStore;
    use tempfile::TempDir;

    fn file_store(temp: &TempDir) -> SoundFileStore {
        SoundFileStore::new(temp.path().join("sounds"), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_is_managed() {
        let temp = TempDir::new().unwrap();
        let store = file_store(&temp);

        let inside = uri::from_local_path(&store.directory().join("kick_1.wav"));
        assert!(store.is_managed(&inside));
        assert!(store.is_managed(&store.directory().join("a.wav").display().to_string()));
        assert!(!store.is_managed("file:///tmp/elsewhere/kick.wav"));
        assert!(!store.is_managed("https://example.com/kick.wav"));
    }

    #[tokio::test]
    async fn test_sound_file_path_stays_inside_directory() {
        let temp = TempDir::new().unwrap();
        let store = file_store(&temp);

        assert_eq!(
            store.sound_file_path("ding.mp3"),
            store.directory().join("ding.mp3")
        );
        assert_eq!(
            store.sound_file_path("../../etc/passwd"),
            store.directory().join("passwd")
        );
    }

    #[test]
    fn test_unique_catalog_id_skips_collisions() {
        let existing = CatalogId::generate();
        let catalog = vec![SoundCatalogEntry {
            id: existing.clone(),
            name: "a".to_string(),
            uri: "/a".to_string(),
            category: "c".to_string(),
            date_added: chrono::Utc::now(),
        }];

        let id = unique_catalog_id(&catalog);
        assert_ne!(id, existing);
    }

    #[tokio::test]
    async fn test_write_base64_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.m4a");

        let err = write_base64("***not base64***", &dest).await.unwrap_err();
        assert!(matches!(err, SoundboardError::SourceUnreadable { .. }));
        assert!(!dest.exists());
    }
}
