//! Board manager - the single mutation authority for boards and sounds
//!
//! Every mutation runs under one async write queue and follows the same
//! write-ahead pattern:
//!
//! 1. compute the next board list from the committed one
//! 2. persist it (with retry)
//! 3. commit it in memory
//! 4. publish events
//!
//! A failed write leaves memory untouched. Reads never wait for the queue;
//! they clone the last committed snapshot.
//!
//! Mutations run on their own task. Dropping the returned future does not
//! cancel a mutation that has started: it still persists, commits and clears
//! its placeholder.

use crate::{
    config::ManagerConfig,
    events::{BoardEvent, EventBus},
    persistence::{persistable, BoardPersistence},
    recovery::{self, RecoveryReport},
    seeding::seed_default_board,
    state::{LifecycleState, Snapshot},
};
use soundboard_core::types::{Board, BoardId, SoundEntry, SoundId, UpdateSoundEntry};
use soundboard_core::{KeyValueStore, Result, SoundFetcher, SoundboardError};
use soundboard_files::{SoundFileStore, SoundSource};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn, Instrument};

/// Handle to the board state; clones share the same boards and write queue
#[derive(Clone)]
pub struct BoardManager {
    config: Arc<ManagerConfig>,
    persistence: BoardPersistence,
    files: Arc<SoundFileStore>,
    fetcher: Arc<dyn SoundFetcher>,
    snapshot: Arc<RwLock<Snapshot>>,
    write_queue: Arc<Mutex<()>>,
    events: EventBus,
}

impl BoardManager {
    /// Create an uninitialized manager; call [`BoardManager::load`] before mutating
    pub fn new(
        config: ManagerConfig,
        store: Arc<dyn KeyValueStore>,
        files: Arc<SoundFileStore>,
        fetcher: Arc<dyn SoundFetcher>,
    ) -> Self {
        let persistence =
            BoardPersistence::new(store, config.persist_retries, config.persist_backoff());

        Self {
            config: Arc::new(config),
            persistence,
            files,
            fetcher,
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            write_queue: Arc::new(Mutex::new(())),
            events: EventBus::default(),
        }
    }

    // ===== Reads =====

    pub fn state(&self) -> LifecycleState {
        self.read().lifecycle
    }

    /// All boards in display order, including in-flight placeholders
    pub fn boards(&self) -> Vec<Board> {
        self.read().boards.clone()
    }

    pub fn current_board(&self) -> Option<Board> {
        self.read().current_board().cloned()
    }

    /// Sound `sid` on the current board
    pub fn find_sound(&self, sid: SoundId) -> Option<SoundEntry> {
        self.read()
            .current_board()
            .and_then(|board| board.find_sound(sid))
            .cloned()
    }

    /// Sids on the current board whose file no longer validates
    pub async fn validate_current_board(&self) -> Vec<SoundId> {
        let Some(board) = self.current_board() else {
            return Vec::new();
        };

        let mut missing = Vec::new();
        for sound in board.sounds.iter().filter(|sound| !sound.processing) {
            if !self.files.validate_sound(&sound.uri).await {
                missing.push(sound.sid);
            }
        }
        missing
    }

    pub fn files(&self) -> &SoundFileStore {
        &self.files
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Register for board events; drop the receiver to unregister
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Ask every subscriber to stop playback
    pub fn stop_all_sounds(&self) {
        self.events.publish(BoardEvent::StopAllSounds);
    }

    // ===== Lifecycle =====

    /// Load persisted boards, validating and recovering every sound
    ///
    /// Seeds the default board when nothing is stored. An unreadable or
    /// too-new board list is an error and is left untouched in the store.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<RecoveryReport> {
        self.detached(move |manager| async move { manager.run_load().await }).await
    }

    async fn run_load(&self) -> Result<RecoveryReport> {
        let _queue = self.write_queue.lock().await;
        self.set_lifecycle(LifecycleState::Loading);

        let result = self.load_boards().await;
        match &result {
            Ok(report) => {
                let snapshot = self.read();
                info!(
                    boards = snapshot.boards.len(),
                    checked = report.checked,
                    recovered = report.recovered.len(),
                    dropped = report.dropped.len(),
                    "Boards loaded"
                );
                self.events.publish(BoardEvent::Loaded {
                    board_count: snapshot.boards.len(),
                    recovered: report.recovered.len(),
                    dropped: report.dropped.len(),
                });
                if let Some(board) = snapshot.current_board() {
                    self.events.publish(current_changed(board));
                }
            }
            Err(err) => {
                warn!(error = %err, "Loading boards failed");
                self.set_lifecycle(LifecycleState::Uninitialized);
            }
        }
        result
    }

    async fn load_boards(&self) -> Result<RecoveryReport> {
        let stored = self.persistence.load().await?;

        let Some(decoded) = stored.filter(|decoded| !decoded.value.is_empty()) else {
            self.set_lifecycle(LifecycleState::SeedingDefault);
            let board = self.seed(&[]).await;
            let boards = vec![board];

            if let Err(err) = self.persistence.save(&boards).await {
                self.publish_persistence_failure(&err);
            }
            let first = boards.first().map(|board| board.id);
            self.commit(boards, first);
            return Ok(RecoveryReport::default());
        };

        let migrated = decoded.needs_rewrite();
        let (boards, report) = recovery::validate_and_recover(
            decoded.value,
            &self.files,
            self.config.validation_batch_size,
        )
        .await;

        if migrated || report.changed() {
            // Boards stay usable even if the corrected list cannot be written
            if let Err(err) = self.persistence.save(&boards).await {
                self.publish_persistence_failure(&err);
            }
        }

        // Selection is not persisted; a load always starts on the first board
        let first = boards.first().map(|board| board.id);
        self.commit(boards, first);
        Ok(report)
    }

    // ===== Board mutations =====

    /// Append an empty board and make it current
    #[instrument(skip(self))]
    pub async fn create_board(&self, name: &str) -> Result<Board> {
        let name = name.to_string();
        self.detached(move |manager| async move { manager.run_create_board(&name).await }).await
    }

    async fn run_create_board(&self, name: &str) -> Result<Board> {
        let _queue = self.begin_mutation().await?;

        let mut next = self.committed_boards();
        let board = Board::new(next_board_id(&next), name);
        next.push(board.clone());

        self.persist(&next).await?;
        self.commit(next, Some(board.id));

        info!(board_id = %board.id, name, "Created board");
        self.publish_boards_changed();
        self.events.publish(current_changed(&board));
        Ok(board)
    }

    /// Select `board_id` as current; returns false for an unknown id
    pub async fn switch_board(&self, board_id: BoardId) -> Result<bool> {
        let _queue = self.begin_mutation().await?;

        let mut snapshot = self.write();
        let Some(board) = snapshot.boards.iter().find(|board| board.id == board_id) else {
            debug!(board_id = %board_id, "Switch to unknown board ignored");
            return Ok(false);
        };

        let event = current_changed(board);
        snapshot.current = Some(board_id);
        drop(snapshot);

        self.events.publish(event);
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn rename_board(&self, board_id: BoardId, new_name: &str) -> Result<()> {
        let new_name = new_name.to_string();
        self.detached(move |manager| async move {
            manager.run_rename_board(board_id, &new_name).await
        })
        .await
    }

    async fn run_rename_board(&self, board_id: BoardId, new_name: &str) -> Result<()> {
        let _queue = self.begin_mutation().await?;

        let mut next = self.committed_boards();
        let board = next
            .iter_mut()
            .find(|board| board.id == board_id)
            .ok_or(SoundboardError::BoardNotFound(board_id))?;
        board.name = new_name.to_string();
        let renamed = board.clone();

        self.persist(&next).await?;
        let is_current = self.read().current == Some(board_id);
        self.commit(next, None);

        self.publish_boards_changed();
        if is_current {
            self.events.publish(current_changed(&renamed));
        }
        Ok(())
    }

    /// Remove a board; the first remaining board becomes current
    ///
    /// Removing the last board seeds a fresh default board. Sound files are
    /// not deleted.
    #[instrument(skip(self))]
    pub async fn remove_board(&self, board_id: BoardId) -> Result<()> {
        self.detached(move |manager| async move { manager.run_remove_board(board_id).await }).await
    }

    async fn run_remove_board(&self, board_id: BoardId) -> Result<()> {
        let _queue = self.begin_mutation().await?;

        let mut next = self.committed_boards();
        let before = next.len();
        next.retain(|board| board.id != board_id);
        if next.len() == before {
            return Err(SoundboardError::BoardNotFound(board_id));
        }

        if next.is_empty() {
            self.set_lifecycle(LifecycleState::SeedingDefault);
            let removed = self.committed_boards();
            next.push(self.seed(&removed).await);
        }

        if let Err(err) = self.persist(&next).await {
            self.set_lifecycle(LifecycleState::Ready);
            return Err(err);
        }

        let current = next.first().map(|board| board.id);
        self.commit(next, current);

        info!(board_id = %board_id, "Removed board");
        self.publish_boards_changed();
        if let Some(board) = self.current_board() {
            self.events.publish(current_changed(&board));
        }
        Ok(())
    }

    // ===== Sound mutations =====

    /// Copy a sound into managed storage and add it to the current board
    ///
    /// A placeholder with `processing` set is visible while the file is
    /// copied. On failure the placeholder is removed and nothing is persisted.
    #[instrument(skip(self, sound), fields(sid = %sound.sid, name = %sound.name))]
    pub async fn update_sound_board(&self, sound: SoundEntry) -> Result<SoundEntry> {
        self.detached(move |manager| async move {
            manager.run_update_sound_board(sound).await
        })
        .await
    }

    async fn run_update_sound_board(&self, sound: SoundEntry) -> Result<SoundEntry> {
        let _queue = self.begin_mutation().await?;

        let board = self
            .current_board()
            .ok_or_else(|| SoundboardError::invalid_input("no current board"))?;
        if board.contains_sound(sound.sid) {
            return Err(SoundboardError::DuplicateSound {
                board_id: board.id,
                sid: sound.sid,
            });
        }

        self.insert_placeholder(board.id, &sound);

        let copied = if self.files.is_managed(&sound.uri) {
            debug!(uri = %sound.uri, "Sound already in managed storage");
            Ok(None)
        } else {
            self.files
                .add_sound(SoundSource::Uri(sound.uri.clone()), &sound.name, &board.name)
                .await
                .map(Some)
        };

        let catalog_entry = match copied {
            Ok(entry) => entry,
            Err(err) => {
                self.remove_placeholder(board.id, sound.sid);
                warn!(error = %err, "Adding sound failed");
                self.events.publish(BoardEvent::SoundAddFailed {
                    board_id: board.id,
                    sid: sound.sid,
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let added = SoundEntry {
            uri: catalog_entry
                .as_ref()
                .map_or_else(|| sound.uri.clone(), |entry| entry.uri.clone()),
            processing: false,
            ..sound
        };

        let mut next = self.committed_boards();
        if let Some(target) = next.iter_mut().find(|target| target.id == board.id) {
            target.sounds.push(added.clone());
        }

        if let Err(err) = self.persist(&next).await {
            self.remove_placeholder(board.id, added.sid);
            if let Some(entry) = catalog_entry {
                // The copy is orphaned without a board entry
                if let Err(cleanup) = self.files.remove_sound(&entry.id).await {
                    warn!(catalog_id = %entry.id, error = %cleanup, "Could not undo copy");
                }
            }
            self.events.publish(BoardEvent::SoundAddFailed {
                board_id: board.id,
                sid: added.sid,
                reason: err.to_string(),
            });
            return Err(err);
        }

        self.commit(next, None);

        info!(board_id = %board.id, sid = %added.sid, uri = %added.uri, "Added sound");
        self.events.publish(BoardEvent::SoundAdded {
            board_id: board.id,
            sid: added.sid,
            uri: added.uri.clone(),
        });
        self.publish_boards_changed();
        Ok(added)
    }

    /// Merge `update` into sound `sid` on the current board
    ///
    /// Returns false when the sound does not exist or nothing changed.
    pub async fn update_board_item(&self, sid: SoundId, update: UpdateSoundEntry) -> Result<bool> {
        self.detached(move |manager| async move {
            manager.run_update_board_item(sid, update).await
        })
        .await
    }

    async fn run_update_board_item(&self, sid: SoundId, update: UpdateSoundEntry) -> Result<bool> {
        let _queue = self.begin_mutation().await?;

        let mut next = self.committed_boards();
        let current = self.read().current;
        let Some(sound) = next
            .iter_mut()
            .find(|board| Some(board.id) == current)
            .and_then(|board| board.sounds.iter_mut().find(|sound| sound.sid == sid))
        else {
            debug!(sid = %sid, "Update for unknown sound ignored");
            return Ok(false);
        };

        let before = sound.clone();
        update.apply_to(sound);
        if *sound == before {
            return Ok(false);
        }

        self.persist(&next).await?;
        self.commit(next, None);

        debug!(sid = %sid, "Updated sound");
        self.publish_boards_changed();
        Ok(true)
    }

    /// Remove sound `sid` from the current board
    ///
    /// The backing file is deleted only when it lives in managed storage and
    /// no other board still uses it.
    #[instrument(skip(self))]
    pub async fn remove_soundboard_item(&self, sid: SoundId) -> Result<SoundEntry> {
        self.detached(move |manager| async move {
            manager.run_remove_soundboard_item(sid).await
        })
        .await
    }

    async fn run_remove_soundboard_item(&self, sid: SoundId) -> Result<SoundEntry> {
        let _queue = self.begin_mutation().await?;

        let board = self
            .current_board()
            .ok_or_else(|| SoundboardError::invalid_input("no current board"))?;
        let removed = board
            .find_sound(sid)
            .filter(|sound| !sound.processing)
            .cloned()
            .ok_or(SoundboardError::SoundNotFound(sid))?;

        let mut next = self.committed_boards();
        if let Some(target) = next.iter_mut().find(|target| target.id == board.id) {
            target.sounds.retain(|sound| sound.sid != sid);
        }

        self.persist(&next).await?;

        let still_referenced = next.iter().any(|other| other.references_uri(&removed.uri));
        let remaining_names: Vec<String> = next
            .iter()
            .find(|target| target.id == board.id)
            .map(|target| target.sounds.iter().map(|sound| sound.name.clone()).collect())
            .unwrap_or_default();
        self.commit(next, None);

        info!(board_id = %board.id, sid = %sid, "Removed sound");
        self.events.publish(BoardEvent::SoundRemoved {
            board_id: board.id,
            sid,
        });
        self.publish_boards_changed();

        if !still_referenced {
            self.delete_sound_file(&removed.uri).await;
        }
        self.update_starter_flag(&remaining_names).await;

        Ok(removed)
    }

    // ===== Internals =====

    /// Run `mutation` on its own task and wait for it
    async fn detached<T, F, Fut>(&self, mutation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let task = tokio::spawn(mutation(self.clone()).in_current_span());
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(SoundboardError::storage(format!(
                "board mutation did not finish: {err}"
            ))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn begin_mutation(&self) -> Result<MutexGuard<'_, ()>> {
        let queue = self.write_queue.lock().await;
        if !self.state().is_ready() {
            return Err(SoundboardError::NotReady);
        }
        Ok(queue)
    }

    fn set_lifecycle(&self, lifecycle: LifecycleState) {
        self.write().lifecycle = lifecycle;
    }

    /// Committed boards without placeholders
    fn committed_boards(&self) -> Vec<Board> {
        persistable(&self.read().boards)
    }

    /// Swap in `boards` and mark the manager ready
    ///
    /// Without `current`, the current id is kept if it still exists, else the
    /// first board is selected.
    fn commit(&self, boards: Vec<Board>, current: Option<BoardId>) {
        let mut snapshot = self.write();
        let keep = current
            .or(snapshot.current)
            .filter(|id| boards.iter().any(|board| board.id == *id));
        snapshot.current = keep.or_else(|| boards.first().map(|board| board.id));
        snapshot.boards = boards;
        snapshot.lifecycle = LifecycleState::Ready;
    }

    async fn persist(&self, boards: &[Board]) -> Result<()> {
        let result = self.persistence.save(boards).await;
        if let Err(err) = &result {
            self.publish_persistence_failure(err);
        }
        result
    }

    async fn seed(&self, existing: &[Board]) -> Board {
        seed_default_board(
            next_board_id(existing),
            &self.config,
            &self.files,
            self.fetcher.as_ref(),
            &self.persistence,
        )
        .await
    }

    fn insert_placeholder(&self, board_id: BoardId, sound: &SoundEntry) {
        let mut snapshot = self.write();
        if let Some(board) = snapshot.boards.iter_mut().find(|board| board.id == board_id) {
            board.sounds.push(SoundEntry {
                processing: true,
                ..sound.clone()
            });
        }
        drop(snapshot);

        self.events.publish(BoardEvent::SoundProcessing {
            board_id,
            sid: sound.sid,
        });
    }

    fn remove_placeholder(&self, board_id: BoardId, sid: SoundId) {
        let mut snapshot = self.write();
        if let Some(board) = snapshot.boards.iter_mut().find(|board| board.id == board_id) {
            board
                .sounds
                .retain(|sound| !(sound.processing && sound.sid == sid));
        }
    }

    /// Best-effort removal of a managed file, through the catalog when possible
    async fn delete_sound_file(&self, location: &str) {
        if !self.files.is_managed(location) {
            debug!(uri = %location, "Leaving external sound file in place");
            return;
        }

        match self.files.find_by_uri(location).await {
            Ok(Some(entry)) => {
                if let Err(err) = self.files.remove_sound(&entry.id).await {
                    warn!(catalog_id = %entry.id, error = %err, "Could not remove catalog entry");
                    self.files.delete_file(location).await;
                }
            }
            Ok(None) => {
                self.files.delete_file(location).await;
            }
            Err(err) => {
                warn!(error = %err, "Catalog unreadable, deleting file only");
                self.files.delete_file(location).await;
            }
        }
    }

    async fn update_starter_flag(&self, remaining_names: &[String]) {
        if self.config.starter_sounds.is_empty() {
            return;
        }
        if remaining_names
            .iter()
            .any(|name| self.config.is_starter_sound(name))
        {
            return;
        }

        if let Err(err) = self.persistence.set_default_sounds_removed().await {
            warn!(error = %err, "Could not record starter sound removal");
            self.publish_persistence_failure(&err);
        }
    }

    fn publish_boards_changed(&self) {
        let board_count = self.read().boards.len();
        self.events
            .publish(BoardEvent::BoardsChanged { board_count });
    }

    fn publish_persistence_failure(&self, err: &SoundboardError) {
        let (key, reason) = match err {
            SoundboardError::PersistenceWriteFailure { key, reason } => {
                (key.clone(), reason.clone())
            }
            other => (String::new(), other.to_string()),
        };
        self.events
            .publish(BoardEvent::PersistenceFailed { key, reason });
    }
}

/// A timestamp id not used by any of `boards`
fn next_board_id(boards: &[Board]) -> BoardId {
    let mut id = BoardId::generate();
    while boards.iter().any(|board| board.id == id) {
        id = id.next();
    }
    id
}

fn current_changed(board: &Board) -> BoardEvent {
    BoardEvent::CurrentBoardChanged {
        board_id: board.id,
        name: board.name.clone(),
    }
}
