//! Default board seeding
//!
//! Builds the board shown on first run (and after the last board is removed),
//! optionally filled with the starter sounds. A starter sound that cannot be
//! downloaded or registered is left out; seeding itself never fails.

use crate::config::ManagerConfig;
use crate::persistence::BoardPersistence;
use soundboard_core::types::{Board, BoardId, SoundEntry, SoundId};
use soundboard_core::{uri, SoundFetcher};
use soundboard_files::SoundFileStore;
use tracing::{debug, info, warn};

/// Catalog category of downloaded starter sounds
pub const STARTER_CATEGORY: &str = "Default";

pub(crate) async fn seed_default_board(
    id: BoardId,
    config: &ManagerConfig,
    files: &SoundFileStore,
    fetcher: &dyn SoundFetcher,
    persistence: &BoardPersistence,
) -> Board {
    let mut board = Board::new(id, config.default_board_name.clone());

    if !config.seed_starter_sounds || config.starter_sounds.is_empty() {
        return board;
    }

    match persistence.default_sounds_removed().await {
        Ok(true) => {
            debug!("Starter sounds were removed by the user, not seeding them");
            return board;
        }
        Ok(false) => {}
        Err(err) => warn!(error = %err, "Could not read starter sound flag, seeding anyway"),
    }

    if let Err(err) = files.ensure_directory_exists().await {
        warn!(error = %err, "Sound directory unavailable, seeding an empty board");
        return board;
    }

    for starter in &config.starter_sounds {
        let path = files.sound_file_path(&starter.name);
        let location = uri::from_local_path(&path);

        if files.validate_sound(&location).await {
            debug!(name = %starter.name, "Starter sound already present");
        } else if let Err(err) = fetcher.fetch(&starter.url, &path).await {
            warn!(name = %starter.name, url = %starter.url, error = %err, "Error downloading starter sound");
            continue;
        }

        if let Err(err) = files
            .register_managed_file(&path, &starter.name, STARTER_CATEGORY)
            .await
        {
            warn!(name = %starter.name, error = %err, "Could not catalog starter sound");
        }

        let sid = fresh_sound_id(&board);
        board
            .sounds
            .push(SoundEntry::new(sid, starter.name.clone(), location).with_title(starter.title.clone()));
    }

    info!(
        board_id = %board.id,
        sounds = board.sounds.len(),
        "Seeded default board"
    );
    board
}

/// A sound id not yet used on `board`
pub(crate) fn fresh_sound_id(board: &Board) -> SoundId {
    let mut sid = SoundId::generate();
    while board.contains_sound(sid) {
        sid = SoundId::generate();
    }
    sid
}
