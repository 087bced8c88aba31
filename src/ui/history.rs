use crate::app::{App, Focus};
use crate::util::{single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the reading history panel.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::History;
    let palette = &app.palette;
    let history = app.session.history();

    let items: Vec<ListItem> = if history.is_empty() {
        vec![ListItem::new(Span::styled(
            "No reading history",
            palette.placeholder,
        ))]
    } else {
        let width = area.width.saturating_sub(2) as usize;
        history
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if is_focused && i == app.selected_history {
                    palette.history_selected
                } else {
                    palette.history_entry
                };
                let text = single_line(entry.as_str());
                ListItem::new(Span::styled(
                    truncate_to_width(&text, width).into_owned(),
                    style,
                ))
            })
            .collect()
    };

    let border_style = if is_focused {
        palette.panel_border_focused
    } else {
        palette.panel_border
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!("History ({})", history.len())),
    );

    // ListState keeps the selection scrolled into view on long histories
    let mut state = ListState::default();
    if !history.is_empty() {
        state.select(Some(app.selected_history));
    }
    f.render_stateful_widget(list, area, &mut state);
}
