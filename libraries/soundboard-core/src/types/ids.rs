/// ID types for soundboard entities
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the random offset mixed into generated sound ids
const SOUND_ID_JITTER: i64 = 1000;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Board identifier (creation timestamp in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(i64);

impl BoardId {
    /// Create a board ID from a raw value
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Generate a timestamp-based board ID
    ///
    /// Uniqueness across boards is enforced by the caller, see [`BoardId::next`].
    pub fn generate() -> Self {
        Self(now_millis())
    }

    /// The following id, used to step past a collision
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Get the raw value
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BoardId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Sound entry identifier, unique within its owning board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundId(i64);

impl SoundId {
    /// Create a sound ID from a raw value
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Generate a sound ID from the current timestamp plus a random offset
    pub fn generate() -> Self {
        let jitter = rand::thread_rng().gen_range(0..SOUND_ID_JITTER);
        Self(now_millis() * SOUND_ID_JITTER + jitter)
    }

    /// Get the raw value
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SoundId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Sound catalog identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(String);

impl CatalogId {
    /// Create a catalog ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a timestamp-based catalog ID
    pub fn generate() -> Self {
        Self(now_millis().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
