//! Manager configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A bundled sound downloaded into the first default board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterSound {
    /// File name inside the managed directory, also the entry name
    pub name: String,
    /// Tile label
    pub title: String,
    /// Download location
    pub url: String,
}

impl StarterSound {
    pub fn new(name: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Board manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name of the board created on first run or after the last board is removed
    pub default_board_name: String,

    /// Sounds validated per batch during load before yielding
    pub validation_batch_size: usize,

    /// Extra attempts after a failed board list write
    pub persist_retries: u32,

    /// Delay before the first retry, doubled for each further retry
    pub persist_backoff_ms: u64,

    /// Whether the default board gets the starter sounds
    pub seed_starter_sounds: bool,

    #[serde(skip)]
    pub starter_sounds: Vec<StarterSound>,
}

impl ManagerConfig {
    pub fn persist_backoff(&self) -> Duration {
        Duration::from_millis(self.persist_backoff_ms)
    }

    /// Configuration without starter sound downloads
    pub fn without_starter_sounds() -> Self {
        Self {
            seed_starter_sounds: false,
            starter_sounds: Vec::new(),
            ..Self::default()
        }
    }

    pub fn is_starter_sound(&self, name: &str) -> bool {
        self.starter_sounds.iter().any(|starter| starter.name == name)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_board_name: "My First Board".to_string(),
            validation_batch_size: 10,
            persist_retries: 3,
            persist_backoff_ms: 50,
            seed_starter_sounds: true,
            starter_sounds: default_starter_sounds(),
        }
    }
}

/// The two sounds shipped with the app
pub fn default_starter_sounds() -> Vec<StarterSound> {
    vec![
        StarterSound::new(
            "crash_notso_software.mp3",
            "Crash Sound",
            "https://firebasestorage.googleapis.com/v0/b/powerlv-a2081.appspot.com/o/assets%2FCrash.mp3?alt=media&token=f7009ced-8eee-4210-ac98-7635d6eb486b",
        ),
        StarterSound::new(
            "ding_notso_software.mp3",
            "Ding Sound",
            "https://firebasestorage.googleapis.com/v0/b/powerlv-a2081.appspot.com/o/assets%2Fding.mp3?alt=media&token=517271f9-5e73-48a1-92bc-fd9438aa24b3",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();

        assert_eq!(config.default_board_name, "My First Board");
        assert_eq!(config.validation_batch_size, 10);
        assert_eq!(config.persist_retries, 3);
        assert_eq!(config.persist_backoff(), Duration::from_millis(50));
        assert_eq!(config.starter_sounds.len(), 2);
        assert!(config.is_starter_sound("ding_notso_software.mp3"));
        assert!(!config.is_starter_sound("kick.wav"));
    }

    #[test]
    fn test_without_starter_sounds() {
        let config = ManagerConfig::without_starter_sounds();

        assert!(!config.seed_starter_sounds);
        assert!(config.starter_sounds.is_empty());
        assert_eq!(config.default_board_name, "My First Board");
    }
}
