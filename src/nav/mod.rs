//! Interaction core: focus, windowing, palette, and effect orchestration.
//!
//! Everything stateful about a session lives here. The [`Navigator`] is the
//! single writer: components expose pure operations or return requested
//! transitions, and only the navigator applies them. Mutations of the forest
//! run as effects through the [`ActionRunner`], one at a time.

pub mod command;
pub mod controller;
pub mod effects;
pub mod input;
pub mod palette;
pub mod partition;
pub mod runner;
pub mod window;

pub use controller::{Navigator, Step};
pub use effects::{EffectContext, EffectOutcome, ViewModel};
pub use palette::{CommandAction, CommandItem, Palette, PaletteSignal, PaletteState};
pub use partition::partition_children;
pub use runner::{ActionRunner, SessionStatus};
pub use window::ScrollWindow;

use crate::forest::NodeId;

/// Which pane consumes keyboard input. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The free-text input line.
    #[default]
    Input,
    /// The child list under the current node.
    Children,
}

/// Direction for lateral navigation between siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingDir {
    /// Toward the previous sibling.
    Prev,
    /// Toward the next sibling.
    Next,
}

/// An effectful action, executed through the runner.
///
/// Every variant suspends on the forest, the engine, or another external
/// resource. Pure state transitions never become actions.
#[derive(Debug, Clone)]
pub enum Action {
    /// Navigate to a node.
    Enter(NodeId),
    /// Navigate to a sibling of the current node.
    Sibling(SiblingDir),
    /// Append text as a user message, then generate replies under it.
    Say(String),
    /// Generate replies under the current node.
    Generate {
        /// Number of candidates to request.
        count: usize,
    },
    /// Bookmark the current node.
    SaveBookmark {
        /// Title for the bookmark.
        title: String,
    },
    /// Delete the current node's subtree.
    DeleteBranch,
    /// Copy text to the system clipboard.
    CopyText(String),
}
