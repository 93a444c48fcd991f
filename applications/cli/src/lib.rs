//! Soundboard command-line front end
//!
//! Configuration loading, subcommand definitions, and their execution against
//! a [`soundboard_state::BoardManager`]. The `soundboard` binary wires these to
//! a SQLite store and the managed sound directory.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{execute, Command};
pub use config::AppConfig;
pub use error::{CliError, Result};
