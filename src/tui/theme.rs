//! TUI theming and colors.

use ratatui::style::{Color, Modifier, Style};

use crate::forest::Role;

/// Application theme.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Name of the theme.
    pub name: String,
    /// Default text color.
    pub foreground: Color,
    /// Primary accent color.
    pub primary: Color,
    /// Border color (unfocused).
    pub border: Color,
    /// Border color (focused).
    pub border_focused: Color,
    /// Selection highlight.
    pub selection: Color,
    /// User message color.
    pub user: Color,
    /// Assistant message color.
    pub assistant: Color,
    /// System message color.
    pub system: Color,
    /// Unread marker color.
    pub unread: Color,
    /// De-emphasized text.
    pub muted: Color,
    /// Error color.
    pub error: Color,
    /// Success/notice color.
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create the default dark theme.
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            foreground: Color::White,
            primary: Color::Cyan,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            selection: Color::DarkGray,
            user: Color::Green,
            assistant: Color::Blue,
            system: Color::Yellow,
            unread: Color::Magenta,
            muted: Color::DarkGray,
            error: Color::Red,
            success: Color::Green,
        }
    }

    /// Create a light theme.
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            foreground: Color::Black,
            primary: Color::Blue,
            border: Color::Gray,
            border_focused: Color::Blue,
            selection: Color::LightBlue,
            user: Color::Green,
            assistant: Color::Blue,
            system: Color::Yellow,
            unread: Color::Magenta,
            muted: Color::Gray,
            error: Color::Red,
            success: Color::Green,
        }
    }

    /// Create a high contrast theme.
    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast".to_string(),
            foreground: Color::White,
            primary: Color::Yellow,
            border: Color::White,
            border_focused: Color::Yellow,
            selection: Color::White,
            user: Color::Green,
            assistant: Color::Cyan,
            system: Color::Yellow,
            unread: Color::Magenta,
            muted: Color::Gray,
            error: Color::Red,
            success: Color::Green,
        }
    }

    /// Get theme by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "high-contrast" | "highcontrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    /// Get style for borders (unfocused).
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for focused borders.
    pub fn border_focused_style(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    /// Get style for selected items.
    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for a message role label.
    pub fn role_style(&self, role: Role) -> Style {
        let color = match role {
            Role::System => self.system,
            Role::User => self.user,
            Role::Assistant => self.assistant,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Get style for unread markers.
    pub fn unread_style(&self) -> Style {
        Style::default()
            .fg(self.unread)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for de-emphasized text.
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Get style for errors.
    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.error)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for success notices.
    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }
}

/// Available themes list.
pub fn available_themes() -> Vec<&'static str> {
    vec!["dark", "light", "high-contrast"]
}
