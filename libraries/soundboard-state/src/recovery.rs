//! Load-time validation and recovery
//!
//! Every sound on every board is validated against the file store. A sound
//! whose file is gone is relinked to a catalog entry with a matching name, or
//! dropped when nothing matches. Repeated sids on a board keep only their
//! first entry.

use soundboard_core::types::{Board, BoardId, SoundCatalogEntry, SoundEntry, SoundId};
use soundboard_files::SoundFileStore;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// How a catalog entry matched a missing sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Normalized name is a substring of the catalog name
    Normalized,
    /// Catalog name equals the sound name
    Exact,
}

/// A catalog entry eligible to replace a missing sound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCandidate<'a> {
    pub entry: &'a SoundCatalogEntry,
    pub kind: MatchKind,
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Sounds validated
    pub checked: usize,
    /// Sounds relinked to a catalog entry
    pub recovered: Vec<(BoardId, SoundId)>,
    /// Sounds removed because nothing matched
    pub dropped: Vec<(BoardId, SoundId)>,
    /// Later entries removed because an earlier one had the same sid
    pub duplicates: Vec<(BoardId, SoundId)>,
}

impl RecoveryReport {
    /// Whether any board was modified
    pub fn changed(&self) -> bool {
        !self.recovered.is_empty() || !self.dropped.is_empty() || !self.duplicates.is_empty()
    }
}

/// Lowercase `name` with whitespace runs collapsed to `_`
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Catalog entries matching `name`, best first
///
/// Exact matches rank above substring matches, then the most recent
/// `dateAdded`, then the later catalog position.
pub fn rank_candidates<'a>(
    name: &str,
    catalog: &'a [SoundCatalogEntry],
) -> Vec<RecoveryCandidate<'a>> {
    let normalized = normalize_name(name);

    let mut candidates: Vec<(usize, RecoveryCandidate<'a>)> = catalog
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let kind = if entry.name == name {
                MatchKind::Exact
            } else if !normalized.is_empty() && entry.name.contains(&normalized) {
                MatchKind::Normalized
            } else {
                return None;
            };
            Some((position, RecoveryCandidate { entry, kind }))
        })
        .collect();

    candidates.sort_by_key(|(position, candidate)| {
        (
            Reverse(candidate.kind),
            Reverse(candidate.entry.date_added),
            Reverse(*position),
        )
    });

    candidates
        .into_iter()
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Validate every sound, relinking or dropping the ones whose file is gone
///
/// Sounds are checked in batches of `batch_size`, yielding to the scheduler
/// between batches.
pub async fn validate_and_recover(
    boards: Vec<Board>,
    files: &SoundFileStore,
    batch_size: usize,
) -> (Vec<Board>, RecoveryReport) {
    let catalog = match files.get_sounds_metadata().await {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(error = %err, "Sound catalog unreadable, recovering without it");
            Vec::new()
        }
    };

    let batch_size = batch_size.max(1);
    let mut report = RecoveryReport::default();
    let mut validated = Vec::with_capacity(boards.len());

    for board in boards {
        let unique = unique_sounds(&board, &mut report);
        let mut sounds = Vec::with_capacity(unique.len());

        for batch in unique.chunks(batch_size) {
            debug!(board_id = %board.id, batch = batch.len(), "Validating sound batch");

            for sound in batch {
                report.checked += 1;

                if files.validate_sound(&sound.uri).await {
                    sounds.push(sound.clone());
                    continue;
                }

                warn!(
                    board = %board.name,
                    sid = %sound.sid,
                    name = %sound.name,
                    uri = %sound.uri,
                    "Invalid sound detected"
                );

                match recover_sound(sound, &catalog, files).await {
                    Some(relinked) => {
                        info!(sid = %sound.sid, uri = %relinked.uri, "Recovered sound");
                        report.recovered.push((board.id, sound.sid));
                        sounds.push(relinked);
                    }
                    None => {
                        warn!(sid = %sound.sid, name = %sound.name, "Could not recover sound");
                        report.dropped.push((board.id, sound.sid));
                    }
                }
            }

            tokio::task::yield_now().await;
        }

        validated.push(Board { sounds, ..board });
    }

    (validated, report)
}

/// Sounds of `board` with only the first entry kept for each sid
fn unique_sounds(board: &Board, report: &mut RecoveryReport) -> Vec<SoundEntry> {
    let mut seen = HashSet::new();
    board
        .sounds
        .iter()
        .filter(|sound| {
            if seen.insert(sound.sid) {
                return true;
            }
            warn!(
                board = %board.name,
                sid = %sound.sid,
                name = %sound.name,
                "Duplicate sound id, keeping the first entry"
            );
            report.duplicates.push((board.id, sound.sid));
            false
        })
        .cloned()
        .collect()
}

async fn recover_sound(
    sound: &SoundEntry,
    catalog: &[SoundCatalogEntry],
    files: &SoundFileStore,
) -> Option<SoundEntry> {
    for candidate in rank_candidates(&sound.name, catalog) {
        if candidate.entry.uri == sound.uri || !files.validate_sound(&candidate.entry.uri).await {
            continue;
        }

        if let Err(err) = files.ensure_catalog_entry(candidate.entry).await {
            warn!(catalog_id = %candidate.entry.id, error = %err, "Could not re-save catalog entry");
        }

        return Some(SoundEntry {
            uri: candidate.entry.uri.clone(),
            recovered: true,
            processing: false,
            ..sound.clone()
        });
    }
    None
}
