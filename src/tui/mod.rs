//! Terminal user interface for arbor.
//!
//! A single-column session view:
//! - Top: transcript from the root down to the current node
//! - Middle: windowed list of the current node's children, unread first
//! - Bottom: input line and status bar
//! - Overlay: fuzzy command palette (Ctrl+P)
//!
//! Built with ratatui for cross-platform terminal support.

mod app;
mod components;
mod events;
mod theme;

pub use app::run;
pub use theme::{available_themes, Theme};
