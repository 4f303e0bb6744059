//! Bounded window over an ordered list.
//!
//! The child pane shows a fixed number of rows out of an arbitrarily long
//! list. [`ScrollWindow`] tracks which item has focus and which item sits at
//! the top of the pane, moving the pane as little as possible: it only
//! scrolls when the focus would otherwise leave the visible range.

use crate::error::{ArborError, Result};

/// Focus and scroll position for one list instance.
///
/// Invariant after [`reconcile`](Self::reconcile): whenever focus is set,
/// `first <= focus < first + capacity`, and `first` stays within
/// `[0, max(0, item_count - capacity)]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollWindow {
    focus: Option<usize>,
    first: usize,
}

impl ScrollWindow {
    /// Fresh window with nothing focused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the focused item, if any.
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Index of the first visible item.
    pub fn first_visible(&self) -> usize {
        self.first
    }

    /// Move focus one item down, entering the list at the top when nothing
    /// was focused. Stops at the last item.
    pub fn advance(&mut self, item_count: usize) {
        if item_count == 0 {
            self.focus = None;
            return;
        }
        self.focus = Some(match self.focus {
            None => 0,
            Some(i) => (i + 1).min(item_count - 1),
        });
    }

    /// Move focus one item up. Retreating past the first item clears focus,
    /// signaling the caller to move focus out of the list.
    pub fn retreat(&mut self) {
        self.focus = match self.focus {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Drop focus without moving the window.
    pub fn escape(&mut self) {
        self.focus = None;
    }

    /// Realign the window after the focus or the item list changed.
    ///
    /// The window moves only when the focus falls outside the visible range,
    /// and then only far enough to bring it back in. A zero capacity is a
    /// configuration error.
    pub fn reconcile(&mut self, item_count: usize, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(ArborError::InvalidConfig {
                message: "List capacity must be at least one row".to_string(),
            });
        }

        if item_count == 0 {
            self.focus = None;
            self.first = 0;
            return Ok(());
        }

        match self.focus.map(|f| f.min(item_count - 1)) {
            Some(focus) => {
                self.focus = Some(focus);
                if focus < self.first {
                    self.first = focus;
                } else if focus > self.first + capacity - 1 {
                    self.first = focus + 1 - capacity;
                }
            }
            None => {
                self.first = 0;
            }
        }

        self.first = self.first.min(item_count.saturating_sub(capacity));
        Ok(())
    }

    /// The visible portion of `items`.
    pub fn visible_slice<'a, T>(&self, items: &'a [T], capacity: usize) -> &'a [T] {
        let start = self.first.min(items.len());
        let end = (start + capacity).min(items.len());
        &items[start..end]
    }
}
