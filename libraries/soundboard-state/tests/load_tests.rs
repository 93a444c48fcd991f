//! Load, validation, recovery, and migration tests

mod test_helpers;

use chrono::{TimeZone, Utc};
use soundboard_core::types::{Board, BoardId, CatalogId, SoundCatalogEntry, SoundId};
use soundboard_core::{KeyValueStore, SoundboardError};
use soundboard_state::{BoardEvent, LifecycleState, ManagerConfig};
use soundboard_storage::keys;
use test_helpers::{drain, fast_config, sound, Harness, MockFetcher};

fn catalog_entry(id: &str, name: &str, location: &str, day: u32) -> SoundCatalogEntry {
    SoundCatalogEntry {
        id: CatalogId::new(id),
        name: name.to_string(),
        uri: location.to_string(),
        category: "Drums".to_string(),
        date_added: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
    }
}

fn missing_uri(harness: &Harness, name: &str) -> String {
    let location = harness.source_file(name, b"x");
    std::fs::remove_file(test_helpers::local_path(&location)).unwrap();
    location
}

#[tokio::test]
async fn test_first_run_seeds_default_board() {
    let harness = Harness::new();
    let mut events = harness.manager.subscribe();

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.checked, 0);
    assert_eq!(harness.manager.state(), LifecycleState::Ready);

    let boards = harness.manager.boards();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].name, "My First Board");
    assert!(boards[0].sounds.is_empty());
    assert_eq!(harness.manager.current_board().unwrap(), boards[0]);
    assert_eq!(harness.persisted_boards().await, boards);

    let events = drain(&mut events);
    assert_eq!(
        events[0],
        BoardEvent::Loaded {
            board_count: 1,
            recovered: 0,
            dropped: 0,
        }
    );
}

#[tokio::test]
async fn test_empty_board_list_seeds_default_board() {
    let harness = Harness::new();
    harness.store_raw_boards("[]").await;

    harness.manager.load().await.unwrap();

    let boards = harness.manager.boards();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].name, "My First Board");
}

#[tokio::test]
async fn test_custom_default_board_name() {
    let config = ManagerConfig {
        default_board_name: "Sketches".to_string(),
        ..fast_config()
    };
    let harness = Harness::with(config, MockFetcher::new());

    harness.manager.load().await.unwrap();

    assert_eq!(
        harness.manager.current_board().unwrap().name,
        harness.manager.config().default_board_name
    );
    assert_eq!(harness.manager.config().default_board_name, "Sketches");
}

#[tokio::test]
async fn test_valid_boards_load_without_rewrite() {
    let harness = Harness::new();
    let kick = harness.managed_file("kick_1.wav", b"kick");
    let mut board = Board::new(BoardId::new(10), "Drums");
    board.sounds.push(sound(1, "kick.wav", &kick).with_title("Kick"));
    harness.store_boards(&[board.clone()]).await;
    let raw_before = harness.store.get(keys::BOARDS_KEY).await.unwrap();

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.checked, 1);
    assert!(!report.changed());
    assert_eq!(harness.manager.boards(), vec![board]);
    assert_eq!(harness.store.get(keys::BOARDS_KEY).await.unwrap(), raw_before);
}

#[tokio::test]
async fn test_missing_sound_is_relinked_from_catalog() {
    let harness = Harness::new();
    let moved = harness.managed_file("kick_1700000000000.wav", b"kick");
    let entry = catalog_entry("1700000000000", "kick.wav", &moved, 1);
    harness.files.save_sounds_metadata(&[entry]).await.unwrap();

    let stale = missing_uri(&harness, "kick.wav");
    let mut board = Board::new(BoardId::new(10), "Drums");
    board.sounds.push(sound(5, "kick.wav", &stale).with_title("Kick"));
    harness.store_boards(&[board]).await;

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.recovered, vec![(BoardId::new(10), SoundId::new(5))]);
    assert!(report.dropped.is_empty());

    let relinked = harness.manager.find_sound(SoundId::new(5)).unwrap();
    assert_eq!(relinked.uri, moved);
    assert_eq!(relinked.title.as_deref(), Some("Kick"));
    assert!(relinked.recovered);

    // Corrected list written back
    let persisted = harness.persisted_boards().await;
    assert_eq!(persisted[0].sounds, vec![relinked]);
    assert_eq!(harness.files.get_sounds_metadata().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_normalized_name_recovery() {
    let harness = Harness::new();
    let take = harness.managed_file("take.wav", b"take");
    harness
        .files
        .save_sounds_metadata(&[catalog_entry("1", "intro_riff_take2.m4a", &take, 1)])
        .await
        .unwrap();

    let stale = missing_uri(&harness, "Intro Riff");
    let mut board = Board::new(BoardId::new(10), "Guitar");
    board.sounds.push(sound(1, "Intro Riff", &stale));
    harness.store_boards(&[board]).await;

    harness.manager.load().await.unwrap();

    assert_eq!(harness.manager.find_sound(SoundId::new(1)).unwrap().uri, take);
}

#[tokio::test]
async fn test_unmatched_sound_is_dropped() {
    let harness = Harness::new();
    let keep = harness.managed_file("snare_1.wav", b"snare");
    let stale = missing_uri(&harness, "kick.wav");

    let mut board = Board::new(BoardId::new(10), "Drums");
    board.sounds.push(sound(1, "kick.wav", &stale));
    board.sounds.push(sound(2, "snare.wav", &keep));
    harness.store_boards(&[board]).await;

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.dropped, vec![(BoardId::new(10), SoundId::new(1))]);
    let current = harness.manager.current_board().unwrap();
    assert_eq!(current.sounds.len(), 1);
    assert_eq!(current.sounds[0].sid, SoundId::new(2));
    assert_eq!(harness.persisted_boards().await[0].sounds.len(), 1);
}

#[tokio::test]
async fn test_recovery_prefers_newest_valid_candidate() {
    let harness = Harness::new();
    let older = harness.managed_file("kick_a.wav", b"a");
    let newer = harness.managed_file("kick_b.wav", b"b");
    let newest_gone = harness.files.sound_file_path("kick_c.wav");
    let newest_gone = soundboard_core::uri::from_local_path(&newest_gone);

    harness
        .files
        .save_sounds_metadata(&[
            catalog_entry("a", "kick.wav", &older, 1),
            catalog_entry("b", "kick.wav", &newer, 5),
            catalog_entry("c", "kick.wav", &newest_gone, 9),
        ])
        .await
        .unwrap();

    let stale = missing_uri(&harness, "kick.wav");
    let mut board = Board::new(BoardId::new(10), "Drums");
    board.sounds.push(sound(1, "kick.wav", &stale));
    harness.store_boards(&[board]).await;

    harness.manager.load().await.unwrap();

    assert_eq!(harness.manager.find_sound(SoundId::new(1)).unwrap().uri, newer);
}

#[tokio::test]
async fn test_unreadable_catalog_still_loads_boards() {
    let harness = Harness::new();
    harness
        .store
        .set(keys::CATALOG_KEY, "{not json")
        .await
        .unwrap();

    let keep = harness.managed_file("snare_1.wav", b"snare");
    let stale = missing_uri(&harness, "kick.wav");
    let mut board = Board::new(BoardId::new(10), "Drums");
    board.sounds.push(sound(1, "kick.wav", &stale));
    board.sounds.push(sound(2, "snare.wav", &keep));
    harness.store_boards(&[board]).await;

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.dropped.len(), 1);
    assert_eq!(harness.manager.current_board().unwrap().sounds.len(), 1);
}

#[tokio::test]
async fn test_small_batches_validate_everything() {
    let config = ManagerConfig {
        validation_batch_size: 1,
        ..fast_config()
    };
    let harness = Harness::with(config, MockFetcher::new());

    let valid = harness.managed_file("tick.wav", b"tick");
    let mut board = Board::new(BoardId::new(10), "Clicks");
    for sid in 0..25 {
        let location = if sid % 5 == 0 {
            missing_uri(&harness, &format!("gone{sid}.wav"))
        } else {
            valid.clone()
        };
        board.sounds.push(sound(sid, &format!("tick{sid}.wav"), &location));
    }
    harness.store_boards(&[board]).await;

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.checked, 25);
    assert_eq!(report.dropped.len(), 5);
    assert_eq!(harness.manager.current_board().unwrap().sounds.len(), 20);
}

// ===== Migration =====

#[tokio::test]
async fn test_flat_sound_list_is_migrated() {
    let harness = Harness::new();
    let kick = harness.managed_file("kick_1.wav", b"kick");
    harness
        .store_raw_boards(&format!(
            r#"[{{"sid": 1, "name": "kick.wav", "uri": "{kick}", "title": "Kick"}}]"#
        ))
        .await;

    harness.manager.load().await.unwrap();

    let boards = harness.manager.boards();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].name, "Imported Sounds");
    assert_eq!(boards[0].sounds[0].display_title(), "Kick");

    let raw = harness.store.get(keys::BOARDS_KEY).await.unwrap().unwrap();
    assert!(raw.contains("\"schemaVersion\":2"));
    assert_eq!(harness.persisted_boards().await, boards);
}

#[tokio::test]
async fn test_repeated_sids_keep_first_entry() {
    let harness = Harness::new();
    let kick = harness.managed_file("kick_1.wav", b"kick");
    let clap = harness.managed_file("clap_1.wav", b"clap");
    harness
        .store_raw_boards(&format!(
            r#"[{{"sid": 1, "name": "kick.wav", "uri": "{kick}"}},
                {{"sid": 1, "name": "clap.wav", "uri": "{clap}"}}]"#
        ))
        .await;

    let report = harness.manager.load().await.unwrap();

    assert_eq!(report.duplicates.len(), 1);
    let current = harness.manager.current_board().unwrap();
    assert!(current.has_unique_sids());
    assert_eq!(current.sounds.len(), 1);
    assert_eq!(current.sounds[0].name, "kick.wav");
    assert_eq!(harness.persisted_boards().await, harness.manager.boards());
}

#[tokio::test]
async fn test_bare_board_array_is_rewritten() {
    let harness = Harness::new();
    harness
        .store_raw_boards(r#"[{"id": 7, "name": "Live Set", "sounds": []}, {"id": 8, "name": "Old"}]"#)
        .await;

    harness.manager.load().await.unwrap();

    let boards = harness.manager.boards();
    assert_eq!(boards.len(), 2);
    assert_eq!(boards[0].id, BoardId::new(7));
    assert!(boards[1].sounds.is_empty());

    let raw = harness.store.get(keys::BOARDS_KEY).await.unwrap().unwrap();
    assert!(raw.starts_with('{'));
}

#[tokio::test]
async fn test_newer_schema_is_left_untouched() {
    let harness = Harness::new();
    let raw = r#"{"schemaVersion": 99, "boards": []}"#;
    harness.store_raw_boards(raw).await;

    let err = harness.manager.load().await.unwrap_err();

    assert!(matches!(err, SoundboardError::Storage(_)));
    assert_eq!(harness.manager.state(), LifecycleState::Uninitialized);
    assert_eq!(
        harness.store.get(keys::BOARDS_KEY).await.unwrap().as_deref(),
        Some(raw)
    );
    assert!(matches!(
        harness.manager.create_board("x").await,
        Err(SoundboardError::NotReady)
    ));
}

#[tokio::test]
async fn test_reload_picks_up_stored_state() {
    let harness = Harness::loaded().await;
    harness.manager.create_board("Drums").await.unwrap();

    harness.manager.load().await.unwrap();

    let boards = harness.manager.boards();
    assert_eq!(boards.len(), 2);
    // Selection is not persisted
    assert_eq!(harness.manager.current_board().unwrap().id, boards[0].id);
}
