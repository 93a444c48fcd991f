//! Board-scoped sound entries

use super::ids::SoundId;
use serde::{Deserialize, Serialize};

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// A sound attached to a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundEntry {
    pub sid: SoundId,
    /// Original file name
    pub name: String,
    /// Resolved storage location (absolute path or URI)
    pub uri: String,
    /// User-editable label, falls back to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Placeholder still being copied into managed storage. Never persisted.
    #[serde(rename = "_processing", default, skip_serializing)]
    pub processing: bool,

    /// Relinked to a catalog entry during load-time recovery
    #[serde(default, skip_serializing_if = "is_false")]
    pub recovered: bool,
}

impl SoundEntry {
    pub fn new(sid: SoundId, name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            sid,
            name: name.into(),
            uri: uri.into(),
            title: None,
            processing: false,
            recovered: false,
        }
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Label shown on the tile
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Partial update for a sound entry (all fields optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSoundEntry {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl UpdateSoundEntry {
    /// Update that only changes the title
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Merge the present fields into `entry`
    pub fn apply_to(&self, entry: &mut SoundEntry) {
        if let Some(name) = &self.name {
            entry.name.clone_from(name);
        }
        if let Some(uri) = &self.uri {
            entry.uri.clone_from(uri);
        }
        if let Some(title) = &self.title {
            entry.title = Some(title.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.uri.is_none() && self.title.is_none()
    }
}
