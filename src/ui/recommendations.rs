use crate::app::{App, Focus};
use crate::util::{single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const READ_MARKER: &str = "✓ ";
const UNREAD_MARKER: &str = "  ";

/// Render the recommendation list panel.
pub fn render_list(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Recommendations;
    let articles = app.session.recommendations();
    let palette = &app.palette;

    let items: Vec<ListItem> = if articles.is_empty() {
        let placeholder = if app.session.is_loading() {
            "Loading recommendations..."
        } else {
            "No recommendations"
        };
        vec![ListItem::new(Span::styled(placeholder, palette.placeholder))]
    } else {
        // Marker + borders take 4 columns
        let title_width = area.width.saturating_sub(4) as usize;
        articles
            .iter()
            .enumerate()
            .map(|(i, article)| {
                let read = app.session.is_read(article);
                let title = single_line(article.display_title());

                let style = if i == app.selected_recommendation {
                    palette.article_selected
                } else if read {
                    palette.article_read
                } else {
                    palette.article_title
                };

                let marker = if read {
                    Span::styled(READ_MARKER, palette.read_marker)
                } else {
                    Span::raw(UNREAD_MARKER)
                };

                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(truncate_to_width(&title, title_width).into_owned(), style),
                ]))
            })
            .collect()
    };

    let border_style = if is_focused {
        palette.panel_border_focused
    } else {
        palette.panel_border
    };

    let title = format!("Recommendations - page {}", app.session.page());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );

    let mut state = ListState::default();
    if !articles.is_empty() {
        state.select(Some(app.selected_recommendation));
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// Render the mark-read card for the selected article.
///
/// Shows category, summary and link, plus the actions available on it.
pub fn render_card(f: &mut Frame, app: &App, area: Rect) {
    let palette = &app.palette;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.card_border);

    let Some(article) = app.selected_article() else {
        f.render_widget(block, area);
        return;
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::with_capacity(4);

    if let Some(category) = &article.category {
        lines.push(Line::from(Span::styled(
            single_line(category).to_uppercase(),
            palette.article_category,
        )));
    }
    if let Some(description) = &article.description {
        lines.push(Line::from(Span::styled(
            single_line(description),
            palette.description,
        )));
    }
    match &article.link {
        Some(link) => lines.push(Line::from(Span::styled(
            truncate_to_width(&single_line(link), inner_width).into_owned(),
            palette.header_meta,
        ))),
        None => lines.push(Line::from(Span::styled("(no link)", palette.placeholder))),
    }

    let action = if app.session.is_read(article) {
        Span::styled("✓ Read", palette.read_marker)
    } else {
        Span::raw("[m] Mark as read")
    };
    lines.push(Line::from(vec![action, Span::raw("   [o] Open")]));

    let title = truncate_to_width(
        &single_line(article.display_title()),
        inner_width.saturating_sub(2),
    )
    .into_owned();

    let card = Paragraph::new(lines)
        .block(block.title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(card, area);
}
