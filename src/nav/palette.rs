//! Command palette: a searchable overlay over every available action.
//!
//! The palette is a three-state machine (closed, picking a command, naming a
//! bookmark). While picking, the full command catalog is regenerated and
//! re-ranked on every keystroke; catalogs are tens of entries at most, so
//! rebuilding beats keeping a filtered list in sync with a mutable bookmark
//! set.

use std::cmp::Ordering;

use super::Action;

/// State transition the palette requests from the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSignal {
    /// Switch the palette into bookmark-naming mode.
    BeginNaming,
    /// Leave the session.
    Quit,
}

/// What confirming a command item does.
#[derive(Debug, Clone)]
pub enum CommandAction {
    /// A pure state transition, applied by the navigator.
    Dispatch(PaletteSignal),
    /// An effect, executed through the runner.
    Effect(Action),
}

/// One selectable palette entry.
#[derive(Debug, Clone)]
pub struct CommandItem {
    /// Stable identifier, independent of the display label.
    pub id: String,
    /// Label shown and matched against the query.
    pub label: String,
    /// What confirming this entry does.
    pub action: CommandAction,
}

impl CommandItem {
    /// Entry that requests a state transition.
    pub fn dispatch(id: &str, label: impl Into<String>, signal: PaletteSignal) -> Self {
        Self {
            id: id.to_string(),
            label: label.into(),
            action: CommandAction::Dispatch(signal),
        }
    }

    /// Entry that runs an effect.
    pub fn effect(id: impl Into<String>, label: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action: CommandAction::Effect(action),
        }
    }
}

/// Palette mode. Exactly one variant is live; every change goes through a
/// [`Palette`] transition.
#[derive(Debug, Clone, Default)]
pub enum PaletteState {
    /// Overlay hidden.
    #[default]
    Closed,
    /// Searching the command catalog.
    Picking {
        /// Current query text.
        query: String,
        /// Ranked catalog for the current query.
        items: Vec<CommandItem>,
        /// Index of the highlighted item.
        selected: usize,
    },
    /// Entering a bookmark title.
    Naming {
        /// Title typed so far.
        title: String,
    },
}

/// The palette state machine.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    state: PaletteState,
}

impl Palette {
    /// New, closed palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    /// Whether the overlay is visible in any mode.
    pub fn is_open(&self) -> bool {
        !matches!(self.state, PaletteState::Closed)
    }

    /// Open in picking mode over the given catalog.
    pub fn open(&mut self, catalog: Vec<CommandItem>) {
        self.state = PaletteState::Picking {
            query: String::new(),
            items: catalog,
            selected: 0,
        };
    }

    /// Hide the overlay, discarding query and selection.
    pub fn close(&mut self) {
        self.state = PaletteState::Closed;
    }

    /// Append one character to the query and re-rank a fresh catalog.
    pub fn push_char(&mut self, ch: char, catalog: Vec<CommandItem>) {
        if let PaletteState::Picking { query, items, selected } = &mut self.state {
            query.push(ch);
            *items = rank_commands(catalog, query);
            *selected = 0;
        }
    }

    /// Remove the last query character and re-rank a fresh catalog.
    pub fn pop_char(&mut self, catalog: Vec<CommandItem>) {
        if let PaletteState::Picking { query, items, selected } = &mut self.state {
            query.pop();
            *items = rank_commands(catalog, query);
            *selected = 0;
        }
    }

    /// Move the highlight, wrapping at both ends.
    pub fn move_selection(&mut self, delta: i32) {
        if let PaletteState::Picking { items, selected, .. } = &mut self.state {
            if items.is_empty() {
                *selected = 0;
                return;
            }
            let len = items.len() as i32;
            let mut idx = *selected as i32 + delta;
            while idx < 0 {
                idx += len;
            }
            *selected = (idx as usize) % items.len();
        }
    }

    /// The highlighted item, if picking.
    pub fn selected_item(&self) -> Option<&CommandItem> {
        match &self.state {
            PaletteState::Picking { items, selected, .. } => items.get(*selected),
            _ => None,
        }
    }

    /// Switch to bookmark-naming mode with an empty title.
    pub fn begin_naming(&mut self) {
        self.state = PaletteState::Naming {
            title: String::new(),
        };
    }

    /// Append one character to the title being entered.
    pub fn push_title_char(&mut self, ch: char) {
        if let PaletteState::Naming { title } = &mut self.state {
            title.push(ch);
        }
    }

    /// Remove the last title character.
    pub fn pop_title_char(&mut self) {
        if let PaletteState::Naming { title } = &mut self.state {
            title.pop();
        }
    }

    /// The title being entered, if naming.
    pub fn title(&self) -> Option<&str> {
        match &self.state {
            PaletteState::Naming { title } => Some(title),
            _ => None,
        }
    }
}

/// Rank a catalog against a query.
///
/// All items are kept; matches sort before non-matches, better matches sort
/// first, and ties keep their catalog order. An empty query is the identity.
pub fn rank_commands(items: Vec<CommandItem>, query: &str) -> Vec<CommandItem> {
    let query = query.trim();
    if query.is_empty() {
        return items;
    }

    let mut scored: Vec<(Option<i64>, CommandItem)> = items
        .into_iter()
        .map(|item| (fuzzy_score(query, &item.label), item))
        .collect();

    // Stable sort, so equal scores preserve catalog order
    scored.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    scored.into_iter().map(|(_, item)| item).collect()
}

/// Score `text` against `query`, higher is better, `None` means no match.
///
/// Tiers: exact match, prefix, substring, then scattered subsequence with a
/// penalty for how widely the matched characters spread.
pub fn fuzzy_score(query: &str, text: &str) -> Option<i64> {
    let q = query.to_ascii_lowercase();
    let t = text.to_ascii_lowercase();
    if t == q {
        return Some(420);
    }
    if t.starts_with(&q) {
        return Some(360 - (t.len().saturating_sub(q.len()) as i64));
    }
    if let Some(idx) = t.find(&q) {
        return Some(300 - (idx as i64 * 4));
    }

    let mut first: Option<usize> = None;
    let mut qchars = q.chars();
    let mut current = qchars.next()?;
    for (idx, ch) in t.chars().enumerate() {
        if ch != current {
            continue;
        }
        if first.is_none() {
            first = Some(idx);
        }
        if let Some(next) = qchars.next() {
            current = next;
        } else {
            let span = idx.saturating_sub(first.unwrap_or(idx)).saturating_add(1);
            let gaps = span.saturating_sub(q.chars().count());
            return Some(180 - span as i64 - (gaps as i64 * 2));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> Vec<CommandItem> {
        vec![
            CommandItem::dispatch("quit", "Quit", PaletteSignal::Quit),
            CommandItem::effect("generate", "Generate replies", Action::Generate { count: 3 }),
            CommandItem::dispatch("save", "Save bookmark here", PaletteSignal::BeginNaming),
            CommandItem::effect(
                "bookmark:intro",
                "Load bookmark: intro",
                Action::DeleteBranch,
            ),
        ]
    }

    fn ids(items: &[CommandItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_open_shows_catalog_in_identity_order() {
        let mut palette = Palette::new();
        palette.open(catalog());

        match palette.state() {
            PaletteState::Picking { query, items, selected } => {
                assert_eq!(query, "");
                assert_eq!(ids(items), vec!["quit", "generate", "save", "bookmark:intro"]);
                assert_eq!(*selected, 0);
            }
            other => panic!("expected picking, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_query_is_identity() {
        let ranked = rank_commands(catalog(), "   ");
        assert_eq!(ids(&ranked), vec!["quit", "generate", "save", "bookmark:intro"]);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let once = rank_commands(catalog(), "bo");
        let twice = rank_commands(catalog(), "bo");
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_query_ranks_matches_first() {
        let mut palette = Palette::new();
        palette.open(catalog());
        for ch in "quit".chars() {
            palette.push_char(ch, catalog());
        }

        let top = palette.selected_item().unwrap();
        assert_eq!(top.id, "quit");
    }

    #[test]
    fn test_non_matching_items_kept_at_bottom() {
        let ranked = rank_commands(catalog(), "bookmark");
        assert_eq!(ranked.len(), 4);
        // Neither "Quit" nor "Generate replies" matches; both sink to the
        // bottom in catalog order
        assert_eq!(ids(&ranked)[2..], ["quit", "generate"]);
    }

    #[test]
    fn test_backspace_restores_broader_ranking() {
        let mut palette = Palette::new();
        palette.open(catalog());
        palette.push_char('q', catalog());
        palette.push_char('z', catalog());
        palette.pop_char(catalog());

        assert_eq!(palette.selected_item().unwrap().id, "quit");
    }

    #[test]
    fn test_selection_wraps_both_directions() {
        let mut palette = Palette::new();
        palette.open(catalog());

        palette.move_selection(-1);
        match palette.state() {
            PaletteState::Picking { selected, .. } => assert_eq!(*selected, 3),
            other => panic!("expected picking, got {other:?}"),
        }

        palette.move_selection(1);
        match palette.state() {
            PaletteState::Picking { selected, .. } => assert_eq!(*selected, 0),
            other => panic!("expected picking, got {other:?}"),
        }
    }

    #[test]
    fn test_selection_noop_on_empty_items() {
        let mut palette = Palette::new();
        palette.open(Vec::new());
        palette.move_selection(1);
        assert!(palette.selected_item().is_none());
    }

    #[test]
    fn test_naming_flow() {
        let mut palette = Palette::new();
        palette.open(catalog());
        palette.begin_naming();
        assert_eq!(palette.title(), Some(""));

        for ch in "draft".chars() {
            palette.push_title_char(ch);
        }
        palette.pop_title_char();
        assert_eq!(palette.title(), Some("draf"));

        palette.close();
        assert!(!palette.is_open());
        assert_eq!(palette.title(), None);
    }

    #[test]
    fn test_fuzzy_score_tiers() {
        let exact = fuzzy_score("quit", "quit").unwrap();
        let prefix = fuzzy_score("qu", "quit").unwrap();
        let substring = fuzzy_score("uit", "quit").unwrap();
        let subsequence = fuzzy_score("qt", "quit").unwrap();

        assert!(exact > prefix);
        assert!(prefix > substring);
        assert!(substring > subsequence);
        assert_eq!(fuzzy_score("xyz", "quit"), None);
    }

    #[test]
    fn test_fuzzy_score_is_case_insensitive() {
        assert_eq!(fuzzy_score("LOAD", "Load bookmark: intro"), fuzzy_score("load", "load bookmark: intro"));
    }

    #[test]
    fn test_tight_subsequence_beats_spread_one() {
        let tight = fuzzy_score("gn", "genuine").unwrap();
        let spread = fuzzy_score("gn", "g123456n").unwrap();
        assert!(tight > spread);
    }
}
