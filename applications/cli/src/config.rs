/// Application configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use soundboard_state::{ManagerConfig, StarterSound};
use std::path::{Path, PathBuf};

/// Config file read from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "soundboard.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub board: ManagerConfig,

    /// Replaces the bundled starter sounds when present
    #[serde(default)]
    pub starter_sounds: Option<Vec<StarterSound>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_sounds_directory")]
    pub sounds_directory: PathBuf,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `soundboard.toml` is read if
    /// present. `SOUNDBOARD_`-prefixed variables override both, with `__`
    /// between section and key (`SOUNDBOARD_STORAGE__DATABASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SOUNDBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.board.validation_batch_size == 0 {
            return Err(CliError::Config(
                "board.validation_batch_size must be at least 1".to_string(),
            ));
        }

        if self.board.default_board_name.trim().is_empty() {
            return Err(CliError::Config(
                "board.default_board_name must not be empty".to_string(),
            ));
        }

        if self.storage.database_url.is_empty() {
            return Err(CliError::Config(
                "storage.database_url is required (set SOUNDBOARD_STORAGE__DATABASE_URL)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Manager settings with the configured starter sounds applied
    pub fn manager_config(&self) -> ManagerConfig {
        let mut manager = self.board.clone();
        if let Some(starter_sounds) = &self.starter_sounds {
            manager.starter_sounds.clone_from(starter_sounds);
        }
        manager
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            sounds_directory: default_sounds_directory(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://./data/soundboard.db".to_string()
}

fn default_sounds_directory() -> PathBuf {
    PathBuf::from("./data/sounds")
}
