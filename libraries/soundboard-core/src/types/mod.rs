mod board;
mod catalog;
mod ids;
mod sound;

pub use board::Board;
pub use catalog::{CatalogPage, SoundCatalogEntry};
pub use ids::{BoardId, CatalogId, SoundId};
pub use sound::{SoundEntry, UpdateSoundEntry};
