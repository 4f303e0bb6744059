//! Bookmarks command implementation.
//!
//! Lists and removes saved bookmarks outside the TUI.

use crate::bookmarks::BookmarkStore;
use crate::cli::{BookmarkAction, BookmarksArgs, Cli};
use crate::config::{self, Config};
use crate::error::{ArborError, Result};

use super::data_dir;

/// Run the bookmarks command.
pub fn run(cli: &Cli, _conf: &Config, args: &BookmarksArgs) -> Result<()> {
    let dir = data_dir(cli)?;
    let path = config::bookmarks_path(&dir);
    let mut store = BookmarkStore::load(&path)?;

    match &args.action {
        BookmarkAction::List => {
            if store.is_empty() {
                println!("No bookmarks saved.");
                return Ok(());
            }

            println!("Bookmarks ({} found):", store.len());
            println!();
            for (title, bookmark) in store.iter() {
                println!(
                    "  {title}  ->  {}  ({})",
                    bookmark.node_id.short(),
                    bookmark.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        BookmarkAction::Remove { title } => {
            if !store.remove(title) {
                return Err(ArborError::validation(format!(
                    "No bookmark named '{title}'"
                )));
            }
            store.save_to(&path)?;
            println!("Removed bookmark '{title}'.");
            Ok(())
        }
    }
}
