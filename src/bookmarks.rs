//! Named positions in the forest.
//!
//! Bookmarks map a unique title to a node id, stored in a JSON file next to
//! the forest data. The navigator reads them to build palette entries and
//! appends new ones; it never edits a bookmark in place.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ArborError, Result};
use crate::forest::NodeId;
use crate::util::atomic_write;

/// One saved position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    /// Node the bookmark points at.
    pub node_id: NodeId,
    /// When the bookmark was created.
    pub created_at: DateTime<Utc>,
    /// When the bookmark last changed.
    pub updated_at: DateTime<Utc>,
}

/// Bookmark collection keyed by title, kept in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkStore {
    /// Version of the bookmark file format.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Bookmarks keyed by their unique title.
    #[serde(default)]
    pub bookmarks: IndexMap<String, Bookmark>,
}

fn default_version() -> u32 {
    1
}

impl BookmarkStore {
    /// Load the store from `path`, or return an empty store when the file
    /// does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the store from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArborError::io(
                format!("Failed to read bookmarks file: {}", path.display()),
                e,
            )
        })?;

        serde_json::from_str(&content).map_err(|e| ArborError::InvalidConfig {
            message: format!("Invalid bookmarks file: {e}"),
        })
    }

    /// Save the store to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ArborError::InvalidConfig {
                message: format!("Failed to serialize bookmarks: {e}"),
            })?;

        atomic_write(path, content.as_bytes())?;
        Ok(())
    }

    /// Add a bookmark.
    ///
    /// The title is trimmed first. An empty or already-taken title is a
    /// validation error; remove the old bookmark to reuse its title.
    pub fn insert(&mut self, title: &str, node_id: NodeId) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ArborError::validation("Bookmark title cannot be empty"));
        }
        if self.bookmarks.contains_key(title) {
            return Err(ArborError::validation(format!(
                "Bookmark '{title}' already exists"
            )));
        }

        let now = Utc::now();
        self.bookmarks.insert(
            title.to_string(),
            Bookmark {
                node_id,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    /// Remove a bookmark by title. Returns whether it existed.
    pub fn remove(&mut self, title: &str) -> bool {
        self.bookmarks.shift_remove(title.trim()).is_some()
    }

    /// Look up a bookmark by title.
    pub fn get(&self, title: &str) -> Option<&Bookmark> {
        self.bookmarks.get(title.trim())
    }

    /// Iterate bookmarks in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bookmark)> {
        self.bookmarks.iter().map(|(title, bm)| (title.as_str(), bm))
    }

    /// Number of bookmarks.
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    /// Whether the store has no bookmarks.
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Drop every bookmark pointing at one of the given nodes.
    ///
    /// Called after subtree deletion so stale titles do not linger in the
    /// palette. Returns the removed titles.
    pub fn prune(&mut self, deleted: &[NodeId]) -> Vec<String> {
        let mut removed = Vec::new();
        self.bookmarks.retain(|title, bm| {
            if deleted.contains(&bm.node_id) {
                removed.push(title.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}
