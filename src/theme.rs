//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Header --
    pub header_title: Style,
    pub header_meta: Style,

    // -- Recommendation list --
    pub article_title: Style,
    pub article_read: Style,
    pub article_selected: Style,
    pub article_category: Style,
    pub read_marker: Style,
    pub description: Style,

    // -- History --
    pub history_entry: Style,
    pub history_selected: Style,
    pub placeholder: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub card_border: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            header_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_meta: Style::default().fg(Color::Gray),

            article_title: Style::default().add_modifier(Modifier::BOLD),
            article_read: Style::default().fg(Color::Gray),
            article_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            article_category: Style::default().fg(Color::Cyan),
            read_marker: Style::default().fg(Color::Green),
            description: Style::default(),

            history_entry: Style::default(),
            history_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            placeholder: Style::default().fg(Color::DarkGray),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            card_border: Style::default().fg(Color::Yellow),
        }
    }

    /// Light palette, adapted for light terminal backgrounds.
    fn light() -> Self {
        Self {
            header_title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_meta: Style::default().fg(Color::DarkGray),

            article_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            article_read: Style::default().fg(Color::DarkGray),
            article_selected: Style::default().bg(Color::Blue).fg(Color::White),
            article_category: Style::default().fg(Color::Blue),
            read_marker: Style::default().fg(Color::Green),
            description: Style::default().fg(Color::Black),

            history_entry: Style::default().fg(Color::Black),
            history_selected: Style::default().bg(Color::Blue).fg(Color::White),
            placeholder: Style::default().fg(Color::DarkGray),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            card_border: Style::default().fg(Color::Magenta),
        }
    }
}
