//! Soundboard Files
//!
//! Physical storage of audio blobs for the soundboard.
//!
//! # Features
//!
//! - Managed directory with idempotent creation
//! - Collision-resistant naming (`<sanitized name>_<id>.<ext>`)
//! - Copy from a local URI or write a base64 payload
//! - Catalog of every managed file, persisted in the key-value store
//! - Validation (exists and non-empty) that never fails
//! - Starter sound downloads over HTTP
//!
//! # Architecture
//!
//! - `naming`: filename sanitization and extension inference
//! - `store`: the [`SoundFileStore`] itself
//! - `download`: [`HttpSoundFetcher`], the `reqwest` implementation of
//!   [`soundboard_core::SoundFetcher`]

mod download;
pub mod naming;
mod store;

pub use download::HttpSoundFetcher;
pub use store::{validate_sound, SoundFileStore, SoundSource};
