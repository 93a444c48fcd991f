//! Subcommands and their execution against a loaded manager

use crate::error::Result;
use clap::Subcommand;
use soundboard_core::types::{BoardId, SoundEntry, SoundId, UpdateSoundEntry};
use soundboard_core::{uri, SoundboardError};
use soundboard_state::BoardManager;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List boards (current board marked with *)
    Boards,
    /// Create a board and make it current
    CreateBoard {
        name: String,
    },
    /// Rename a board
    RenameBoard {
        id: i64,
        name: String,
    },
    /// Remove a board (the last board is replaced by a default one)
    RemoveBoard {
        id: i64,
    },
    /// Copy an audio file into managed storage and add it to the current board
    AddSound {
        path: PathBuf,
        /// Tile label, defaults to the file name
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Change the title of a sound on the current board
    RenameSound {
        sid: i64,
        title: String,
    },
    /// Remove a sound from the current board
    RemoveSound {
        sid: i64,
    },
    /// List the sound catalog
    Catalog {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Report sounds on the current board whose file is missing
    Validate,
}

/// Run `command`, writing human-readable output to `out`
pub async fn execute(manager: &BoardManager, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Boards => list_boards(manager, out)?,
        Command::CreateBoard { name } => {
            let board = manager.create_board(&name).await?;
            writeln!(out, "Created board {} ({})", board.name, board.id)?;
        }
        Command::RenameBoard { id, name } => {
            manager.rename_board(BoardId::new(id), &name).await?;
            writeln!(out, "Renamed board {id} to {name}")?;
        }
        Command::RemoveBoard { id } => {
            manager.remove_board(BoardId::new(id)).await?;
            writeln!(out, "Removed board {id}")?;
            list_boards(manager, out)?;
        }
        Command::AddSound { path, title } => {
            let entry = add_sound(manager, path, title).await?;
            writeln!(
                out,
                "Added {} ({}) -> {}",
                entry.display_title(),
                entry.sid,
                entry.uri
            )?;
        }
        Command::RenameSound { sid, title } => {
            let changed = manager
                .update_board_item(SoundId::new(sid), UpdateSoundEntry::title(&title))
                .await?;
            if changed {
                writeln!(out, "Renamed sound {sid} to {title}")?;
            } else {
                writeln!(out, "No change to sound {sid}")?;
            }
        }
        Command::RemoveSound { sid } => {
            let removed = manager.remove_soundboard_item(SoundId::new(sid)).await?;
            writeln!(out, "Removed {} ({})", removed.display_title(), removed.sid)?;
        }
        Command::Catalog { page, limit } => {
            let page = manager
                .files()
                .get_sounds_metadata_paginated(page, limit)
                .await?;
            for entry in &page.sounds {
                writeln!(
                    out,
                    "{}  {}  [{}]  {}  {}",
                    entry.id,
                    entry.name,
                    entry.category,
                    entry.date_added.format("%Y-%m-%d %H:%M"),
                    entry.uri
                )?;
            }
            writeln!(
                out,
                "page {} ({} of {} sounds){}",
                page.page,
                page.sounds.len(),
                page.total,
                if page.has_more { ", more available" } else { "" }
            )?;
        }
        Command::Validate => {
            let missing = manager.validate_current_board().await;
            if missing.is_empty() {
                writeln!(out, "All sounds valid")?;
            } else {
                for sid in missing {
                    let name = manager
                        .find_sound(sid)
                        .map(|sound| sound.display_title().to_string())
                        .unwrap_or_default();
                    writeln!(out, "Missing file: {name} ({sid})")?;
                }
            }
        }
    }
    Ok(())
}

fn list_boards(manager: &BoardManager, out: &mut impl Write) -> Result<()> {
    let current = manager.current_board().map(|board| board.id);
    for board in manager.boards() {
        let marker = if Some(board.id) == current { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {}  {}  ({} sounds)",
            board.id,
            board.name,
            board.sounds.len()
        )?;
        if Some(board.id) == current {
            for sound in &board.sounds {
                writeln!(out, "      {}  {}", sound.sid, sound.display_title())?;
            }
        }
    }
    Ok(())
}

async fn add_sound(
    manager: &BoardManager,
    path: PathBuf,
    title: Option<String>,
) -> Result<SoundEntry> {
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SoundboardError::invalid_input(format!("{} has no file name", path.display())))?
        .to_string();

    let mut sid = SoundId::generate();
    while manager.find_sound(sid).is_some() {
        sid = SoundId::generate();
    }

    let mut entry = SoundEntry::new(sid, name, uri::from_local_path(&path));
    if let Some(title) = title {
        entry = entry.with_title(title);
    }

    Ok(manager.update_sound_board(entry).await?)
}
