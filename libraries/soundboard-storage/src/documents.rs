//! Versioned persisted documents
//!
//! Board lists and the sound catalog are stored as JSON documents carrying a
//! `schemaVersion`. Older shapes are migrated on decode:
//!
//! | Document | Version | Shape |
//! |---|---|---|
//! | boards | 0 | bare array of sound entries (single flat list, pre-boards) |
//! | boards | 1 | bare array of boards |
//! | boards | 2 | `{"schemaVersion": 2, "boards": [...]}` |
//! | catalog | 0 | bare array of catalog entries |
//! | catalog | 1 | `{"schemaVersion": 1, "sounds": [...]}` |

use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use soundboard_core::types::{Board, BoardId, SoundCatalogEntry, SoundEntry};

/// Current board list schema
pub const BOARDS_SCHEMA_VERSION: u32 = 2;

/// Current catalog schema
pub const CATALOG_SCHEMA_VERSION: u32 = 1;

/// Name of the board created when migrating a pre-boards flat sound list
pub const MIGRATED_BOARD_NAME: &str = "Imported Sounds";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardsDocument {
    schema_version: u32,
    boards: Vec<Board>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    schema_version: u32,
    sounds: Vec<SoundCatalogEntry>,
}

/// Result of decoding a persisted document
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    /// Schema the document was stored in, when older than current
    pub migrated_from: Option<u32>,
}

impl<T> Decoded<T> {
    fn current(value: T) -> Self {
        Self {
            value,
            migrated_from: None,
        }
    }

    fn migrated(value: T, from: u32) -> Self {
        Self {
            value,
            migrated_from: Some(from),
        }
    }

    /// Whether the stored form should be rewritten in the current schema
    pub fn needs_rewrite(&self) -> bool {
        self.migrated_from.is_some()
    }
}

/// Encode a board list in the current schema
pub fn encode_boards(boards: &[Board]) -> Result<String> {
    let document = BoardsDocument {
        schema_version: BOARDS_SCHEMA_VERSION,
        boards: boards.to_vec(),
    };
    Ok(serde_json::to_string(&document)?)
}

/// Decode a stored board list, migrating older schemas
pub fn decode_boards(raw: &str) -> Result<Decoded<Vec<Board>>> {
    let value: Value = serde_json::from_str(raw)?;

    match value {
        Value::Object(ref map) if map.contains_key("schemaVersion") => {
            let found = schema_version(map.get("schemaVersion"), "board list")?;
            if found > BOARDS_SCHEMA_VERSION {
                return Err(StorageError::UnsupportedSchema {
                    document: "board list",
                    found,
                    supported: BOARDS_SCHEMA_VERSION,
                });
            }
            let document: BoardsDocument = serde_json::from_value(value)?;
            if found < BOARDS_SCHEMA_VERSION {
                Ok(Decoded::migrated(document.boards, found))
            } else {
                Ok(Decoded::current(document.boards))
            }
        }
        Value::Array(items) => {
            if items.iter().any(is_legacy_sound_entry) {
                let sounds: Vec<SoundEntry> = serde_json::from_value(Value::Array(items))?;
                let mut board = Board::new(BoardId::generate(), MIGRATED_BOARD_NAME);
                board.sounds = sounds;
                Ok(Decoded::migrated(vec![board], 0))
            } else {
                let boards: Vec<Board> = serde_json::from_value(Value::Array(items))?;
                Ok(Decoded::migrated(boards, 1))
            }
        }
        other => Err(StorageError::Malformed {
            document: "board list",
            reason: format!("unexpected JSON {}", json_kind(&other)),
        }),
    }
}

/// Encode the catalog in the current schema
pub fn encode_catalog(sounds: &[SoundCatalogEntry]) -> Result<String> {
    let document = CatalogDocument {
        schema_version: CATALOG_SCHEMA_VERSION,
        sounds: sounds.to_vec(),
    };
    Ok(serde_json::to_string(&document)?)
}

/// Decode a stored catalog, migrating older schemas
pub fn decode_catalog(raw: &str) -> Result<Decoded<Vec<SoundCatalogEntry>>> {
    let value: Value = serde_json::from_str(raw)?;

    match value {
        Value::Object(ref map) if map.contains_key("schemaVersion") => {
            let found = schema_version(map.get("schemaVersion"), "catalog")?;
            if found > CATALOG_SCHEMA_VERSION {
                return Err(StorageError::UnsupportedSchema {
                    document: "catalog",
                    found,
                    supported: CATALOG_SCHEMA_VERSION,
                });
            }
            let document: CatalogDocument = serde_json::from_value(value)?;
            Ok(Decoded::current(document.sounds))
        }
        Value::Array(_) => {
            let sounds: Vec<SoundCatalogEntry> = serde_json::from_value(value)?;
            Ok(Decoded::migrated(sounds, 0))
        }
        other => Err(StorageError::Malformed {
            document: "catalog",
            reason: format!("unexpected JSON {}", json_kind(&other)),
        }),
    }
}

fn schema_version(value: Option<&Value>, document: &'static str) -> Result<u32> {
    value
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| StorageError::Malformed {
            document,
            reason: "schemaVersion is not a non-negative integer".to_string(),
        })
}

// Flat-list entries carry a `sid`; boards carry `sounds`
fn is_legacy_sound_entry(item: &Value) -> bool {
    item.get("sid").is_some() && item.get("sounds").is_none()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
