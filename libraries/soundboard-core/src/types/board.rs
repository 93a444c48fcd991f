//! Board domain type

use super::ids::{BoardId, SoundId};
use super::sound::SoundEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named, ordered collection of sound entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    /// Insertion order is display order
    #[serde(default)]
    pub sounds: Vec<SoundEntry>,
}

impl Board {
    /// Create an empty board
    pub fn new(id: BoardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sounds: Vec::new(),
        }
    }

    pub fn find_sound(&self, sid: SoundId) -> Option<&SoundEntry> {
        self.sounds.iter().find(|sound| sound.sid == sid)
    }

    pub fn contains_sound(&self, sid: SoundId) -> bool {
        self.find_sound(sid).is_some()
    }

    /// Whether any entry on this board points at `uri`
    pub fn references_uri(&self, uri: &str) -> bool {
        self.sounds.iter().any(|sound| sound.uri == uri)
    }

    /// Check that no two entries share a `sid`
    pub fn has_unique_sids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.sounds.len());
        self.sounds.iter().all(|sound| seen.insert(sound.sid))
    }
}
