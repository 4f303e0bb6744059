//! arbor: interactive terminal navigator for branching LLM conversations.
//!
//! Conversations with a language model are trees, not transcripts: every
//! prompt can fan out into several candidate replies, and every reply can be
//! branched again. arbor stores those trees on disk and gives you a TUI to
//! walk them, with unread markers on branches you have not visited yet.
//!
//! # Features
//!
//! - **Branching by default**: ask for N completions and get N sibling nodes
//! - **Unread tracking**: fresh branches are tagged and surfaced first
//! - **Durable position**: the cursor survives restarts, bookmarks name spots
//! - **Dual interface**: scriptable CLI subcommands plus the interactive TUI
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use arbor::forest::{FileForest, Forest, TreeConfig};
//!
//! #[tokio::main]
//! async fn main() -> arbor::Result<()> {
//!     let forest = FileForest::in_memory();
//!
//!     let config = TreeConfig {
//!         provider: "openai".to_string(),
//!         model: "gpt-4o-mini".to_string(),
//!         temperature: None,
//!         max_tokens: None,
//!     };
//!     let root = forest
//!         .create_root(config, "You are a helpful assistant.".to_string())
//!         .await?;
//!     println!("root: {}", root.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`forest`]: node storage, tree structure, and the [`forest::Forest`] trait
//! - [`engine`]: reply generation backends (HTTP providers, scripted offline)
//! - [`nav`]: navigation state machine, child windowing, command palette
//! - [`bookmarks`]: named positions persisted across sessions
//! - [`tui`]: terminal user interface
//! - [`cli`]: command-line interface
//! - [`config`]: configuration management
//! - [`error`]: error types and handling

#![doc(html_root_url = "https://docs.rs/arbor/0.1.0")]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bookmarks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod forest;
pub mod nav;
pub mod tui;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{ArborError, Result};
pub use forest::NodeId;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {

    pub use crate::bookmarks::BookmarkStore;
    pub use crate::engine::{Engine, ScriptedEngine};
    pub use crate::error::{ArborError, Result};
    pub use crate::forest::{FileForest, Forest, Message, NodeId, NodeSnapshot, Role, TreeConfig};
}
