//! TUI application main loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame, Terminal,
};

use crate::error::{ArborError, Result};
use crate::forest::NodeId;
use crate::nav::{
    effects, Action, CommandItem, EffectContext, EffectOutcome, Focus, Navigator, PaletteState,
    SessionStatus, Step,
};
use crate::util::truncate_line;

use super::components::StatusBar;
use super::events::{Event, EventHandler};
use super::theme::Theme;

/// Tick cadence for the event loop; drives effect polling.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Run the TUI over an opened context, starting at `start`.
pub async fn run(
    ctx: Arc<EffectContext>,
    start: NodeId,
    theme: Theme,
    child_rows: usize,
    debug: bool,
) -> Result<()> {
    // Entering the start node is a navigation like any other: it clears the
    // unread marker and persists the cursor
    let outcome = effects::perform(&ctx, &start, Action::Enter(start.clone())).await?;
    let EffectOutcome::View(view) = outcome else {
        return Err(ArborError::invariant(
            "entering the start node produced no view",
        ));
    };
    let mut navigator = Navigator::new(ctx, *view, child_rows, debug)?;

    // Setup terminal
    enable_raw_mode().map_err(|e| {
        ArborError::io(
            "cannot launch the TUI, no interactive terminal is available",
            e,
        )
    })?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| ArborError::io("failed to enter alternate screen", e))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| ArborError::io("failed to create terminal", e))?;

    // Main loop
    let result = run_loop(&mut terminal, &mut navigator, &theme).await;

    // Restore terminal
    disable_raw_mode().map_err(|e| ArborError::io("failed to disable raw mode", e))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| ArborError::io("failed to leave alternate screen", e))?;
    terminal
        .show_cursor()
        .map_err(|e| ArborError::io("failed to show cursor", e))?;

    result
}

/// Main event loop.
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    navigator: &mut Navigator,
    theme: &Theme,
) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    loop {
        terminal
            .draw(|f| draw_ui(f, navigator, theme))
            .map_err(|e| ArborError::io("failed to draw the TUI", e))?;

        let step = match events.next().await? {
            Event::Tick => navigator.poll_effects().await?,
            Event::Key(key) => navigator.handle_key(key)?,
            Event::Resize(_, _) => Step::Continue,
        };
        if step == Step::Quit {
            return Ok(());
        }
    }
}

fn draw_ui(f: &mut Frame, navigator: &Navigator, theme: &Theme) {
    // Children pane collapses on leaf nodes
    let children_height = if navigator.view().children.is_empty() {
        0
    } else {
        navigator.child_rows() as u16 + 2
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(children_height),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_conversation(f, navigator, theme, chunks[0]);
    if children_height > 0 {
        draw_children(f, navigator, theme, chunks[1]);
    }
    draw_input(f, navigator, theme, chunks[2]);
    draw_status(f, navigator, theme, chunks[3]);

    if navigator.palette().is_open() {
        draw_palette(f, navigator, theme);
    }
}

/// Draw the transcript from the root down to the current node.
fn draw_conversation(f: &mut Frame, navigator: &Navigator, theme: &Theme, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let height = area.height.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::new();
    let last = navigator.view().history.len().saturating_sub(1);
    for (i, node) in navigator.view().history.iter().enumerate() {
        let mut label = vec![Span::styled(
            node.message.role.to_string(),
            theme.role_style(node.message.role),
        )];
        if let Some(model) = &node.meta.model {
            label.push(Span::styled(format!(" · {model}"), theme.muted_style()));
        }
        lines.push(Line::from(label));
        for text in wrap_plain(&node.message.content, width) {
            lines.push(Line::from(text));
        }
        if i != last {
            lines.push(Line::from(""));
        }
    }

    // Stick to the bottom so the current node stays in view
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

    let title = match navigator.view().sibling_pos {
        Some((index, total)) if total > 1 => {
            format!(" conversation · branch {}/{} ", index + 1, total)
        }
        _ => " conversation ".to_string(),
    };

    let paragraph = Paragraph::new(visible).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(theme.border_style()),
    );
    f.render_widget(paragraph, area);
}

/// Draw the child list under the transcript.
fn draw_children(f: &mut Frame, navigator: &Navigator, theme: &Theme, area: Rect) {
    let focused = navigator.focus() == Focus::Children && !navigator.palette().is_open();
    let border_style = if focused {
        theme.border_focused_style()
    } else {
        theme.border_style()
    };

    let children = &navigator.view().children;
    let first = navigator.window().first_visible();
    let width = area.width.saturating_sub(6) as usize;

    let items: Vec<ListItem> = navigator
        .window()
        .visible_slice(children, navigator.child_rows())
        .iter()
        .enumerate()
        .map(|(offset, child)| {
            let index = first + offset;
            let is_cursor = navigator.window().focus() == Some(index);

            let marker = if child.is_unread() {
                Span::styled("● ", theme.unread_style())
            } else {
                Span::raw("  ")
            };
            let preview = truncate_line(&child.message.content, width);
            let item = ListItem::new(Line::from(vec![marker, Span::raw(preview)]));
            if is_cursor {
                item.style(theme.selection_style())
            } else {
                item
            }
        })
        .collect();

    let unread = children.iter().filter(|c| c.is_unread()).count();
    let title = if unread > 0 {
        format!(" replies ({}, {} new) ", children.len(), unread)
    } else {
        format!(" replies ({}) ", children.len())
    };

    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(list, area);
}

/// Draw the input line.
fn draw_input(f: &mut Frame, navigator: &Navigator, theme: &Theme, area: Rect) {
    let focused = navigator.focus() == Focus::Input && !navigator.palette().is_open();
    let border_style = if focused {
        theme.border_focused_style()
    } else {
        theme.border_style()
    };

    let mut spans = vec![Span::styled("> ", Style::default().fg(theme.primary))];
    let text = navigator.input().text();
    if focused {
        let chars: Vec<char> = text.chars().collect();
        let cursor = navigator.input().cursor_char_pos();
        let before: String = chars[..cursor].iter().collect();
        spans.push(Span::raw(before));
        match chars.get(cursor) {
            Some(ch) => {
                spans.push(Span::styled(
                    ch.to_string(),
                    Style::default().add_modifier(Modifier::REVERSED),
                ));
                let after: String = chars[cursor + 1..].iter().collect();
                spans.push(Span::raw(after));
            }
            None => spans.push(Span::styled("█", Style::default().fg(theme.primary))),
        }
        if text.is_empty() {
            spans.push(Span::styled(
                " say something, or / for a command",
                theme.muted_style(),
            ));
        }
    } else {
        spans.push(Span::raw(text.to_string()));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(" message ")
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(paragraph, area);
}

/// Draw the status bar.
fn draw_status(f: &mut Frame, navigator: &Navigator, theme: &Theme, area: Rect) {
    let mut left = vec![
        Span::styled(
            " arbor ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
    ];
    match navigator.status() {
        SessionStatus::Loading => {
            left.push(Span::styled("thinking...", Style::default().fg(theme.primary)));
        }
        SessionStatus::Errored(message) => {
            left.push(Span::styled(message.clone(), theme.error_style()));
        }
        SessionStatus::Idle => match navigator.notice() {
            Some(notice) => left.push(Span::styled(notice.to_string(), theme.success_style())),
            None => left.push(Span::styled(
                "Enter send │ / command │ ^P palette │ Alt+arrows move",
                theme.muted_style(),
            )),
        },
    }

    let mut right = Vec::new();
    if let Some(config) = &navigator.view().root().config {
        right.push(Span::raw(format!("{}@{} ", config.model, config.provider)));
        right.push(Span::raw("│ "));
    }
    right.push(Span::raw(format!("{} ", navigator.view().node.id.short())));

    StatusBar::new().left(left).right(right).render(f, area);
}

/// Draw the palette overlay.
fn draw_palette(f: &mut Frame, navigator: &Navigator, theme: &Theme) {
    match navigator.palette().state() {
        PaletteState::Picking {
            query,
            items,
            selected,
        } => draw_picker(f, theme, query, items, *selected),
        PaletteState::Naming { title } => draw_naming(f, theme, title),
        PaletteState::Closed => {}
    }
}

fn draw_picker(f: &mut Frame, theme: &Theme, query: &str, items: &[CommandItem], selected: usize) {
    let area = centered_rect(50, 60, f.area());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.primary)),
            Span::raw(query.to_string()),
            Span::styled("█", Style::default().fg(theme.primary)),
        ]),
        Line::from(""),
    ];

    // Keep the selected row visible
    let max_visible = (area.height as usize).saturating_sub(5).max(1);
    let scroll = if selected >= max_visible {
        selected - max_visible + 1
    } else {
        0
    };

    for (index, item) in items.iter().enumerate().skip(scroll).take(max_visible) {
        let is_selected = index == selected;
        let style = if is_selected {
            Style::default()
                .fg(Color::Black)
                .bg(theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.foreground)
        };
        let prefix = if is_selected { "▶ " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{prefix}{}", item.label),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑/↓ navigate │ Enter run │ Esc close",
        theme.muted_style(),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" commands ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.primary))
            .style(Style::default().bg(Color::Black)),
    );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn draw_naming(f: &mut Frame, theme: &Theme, title: &str) {
    let area = centered_rect(40, 20, f.area());

    let lines = vec![
        Line::from(Span::raw("Name this position:")),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.primary)),
            Span::raw(title.to_string()),
            Span::styled("█", Style::default().fg(theme.primary)),
        ]),
        Line::from(""),
        Line::from(Span::styled("Enter save │ Esc cancel", theme.muted_style())),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" save bookmark ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.primary))
            .style(Style::default().bg(Color::Black)),
    );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Soft-wrap plain text at a character width, preserving blank lines.
fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for raw in text.lines() {
        let mut line = String::new();
        let mut len = 0usize;
        for word in raw.split_whitespace() {
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len > width {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            if word_len > width {
                // Hard-break words longer than the pane
                for ch in word.chars() {
                    if len == width {
                        out.push(std::mem::take(&mut line));
                        len = 0;
                    }
                    line.push(ch);
                    len += 1;
                }
            } else {
                line.push_str(word);
                len += word_len;
            }
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wrap_plain_word_boundaries() {
        assert_eq!(wrap_plain("one two three", 7), vec!["one two", "three"]);
    }

    #[test]
    fn test_wrap_plain_hard_breaks_long_words() {
        assert_eq!(wrap_plain("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_plain_preserves_blank_lines() {
        assert_eq!(wrap_plain("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn test_wrap_plain_zero_width_clamps_to_one_column() {
        assert_eq!(wrap_plain("hi", 0), vec!["h", "i"]);
    }
}
