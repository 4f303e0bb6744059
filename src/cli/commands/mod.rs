//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod bookmarks;
pub mod config;
pub mod new;
pub mod trees;
pub mod tui;

use std::path::PathBuf;

use crate::cli::Cli;
use crate::error::Result;

/// Resolve the data directory from CLI args or the platform default.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => crate::config::default_data_dir(),
    }
}
