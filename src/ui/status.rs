use crate::app::{App, StatusKind};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const HINTS: &str = "[m]ark read [n]ext page [r]eload [C]lear history [R]eset [o]pen [Tab]switch [?]help [q]uit";

/// Render the status bar: the current notification, or key hints.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style): (Cow<'_, str>, _) = match &app.status_message {
        Some(msg) => {
            let style = match msg.kind {
                StatusKind::Info => app.palette.status_bar,
                StatusKind::Error => app.palette.status_error,
            };
            (Cow::Owned(format!("{}  (Esc to dismiss)", msg.text)), style)
        }
        None => (Cow::Borrowed(HINTS), app.palette.status_bar),
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}
