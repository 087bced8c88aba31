//! Render functions for the TUI.
//!
//! One screen: a header line, the recommendation list with the mark-read card
//! for the selected article on the left, the reading history on the right,
//! and the status bar at the bottom.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::loop_runner::SPINNER_FRAMES;
use super::{help, history, recommendations, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

const SPINNER: [char; SPINNER_FRAMES] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Height of the mark-read card below the recommendation list.
const CARD_HEIGHT: u16 = 7;

/// Main render dispatch function.
pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, rows[0]);
    render_main_panels(f, app, rows[1]);
    status::render(f, app, rows[2]);

    if app.show_help {
        help::render(f, app);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let mut spans = vec![
        Span::styled(" newsrec ", app.palette.header_title),
        Span::styled(
            format!(
                " user {} | page {} | {} read",
                session.user_id(),
                session.page(),
                session.read_set().len()
            ),
            app.palette.header_meta,
        ),
    ];
    if session.is_loading() {
        spans.push(Span::styled(
            format!("  {} loading", SPINNER[app.spinner_frame % SPINNER_FRAMES]),
            app.palette.header_meta,
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Recommendations (list + card) on the left, history on the right.
fn render_main_panels(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(CARD_HEIGHT)])
        .split(columns[0]);

    recommendations::render_list(f, app, left[0]);
    recommendations::render_card(f, app, left[1]);
    history::render(f, app, columns[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Article, HistoryEntry, RecommendationClient};
    use crate::config::Config;
    use crate::session::Session;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    fn test_app() -> App {
        let client =
            RecommendationClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Session::new("user_123"), client, &Config::default())
    }

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_too_small_terminal() {
        let app = test_app();
        let screen = draw(&app, 40, 8);
        assert!(screen.contains("Terminal too small"));
    }

    #[test]
    fn test_renders_recommendations_history_and_card() {
        let mut app = test_app();
        let pending = app.session.begin_recommendation_fetch();
        app.session.finish_recommendation_fetch(
            pending.generation,
            Ok(vec![
                Article::titled("Alpha").with_link("https://news.example/alpha"),
                Article::titled("Beta").with_link("https://news.example/beta"),
            ]),
        );
        app.session
            .set_history(vec![HistoryEntry::new("Yesterday's story")]);
        app.session.mark_read_locally("https://news.example/beta");

        let screen = draw(&app, 100, 30);
        assert!(screen.contains("Alpha"));
        assert!(screen.contains("Beta"));
        assert!(screen.contains("Yesterday's story"));
        assert!(screen.contains("Mark as read"));
        assert!(screen.contains("user user_123 | page 1 | 1 read"));
    }

    #[test]
    fn test_empty_state_placeholders() {
        let app = test_app();
        let screen = draw(&app, 100, 30);
        assert!(screen.contains("No recommendations"));
        assert!(screen.contains("No reading history"));
    }

    #[test]
    fn test_loading_indicator() {
        let mut app = test_app();
        let _pending = app.session.begin_recommendation_fetch();
        let screen = draw(&app, 100, 30);
        assert!(screen.contains("loading"));
    }

    #[test]
    fn test_help_overlay_lists_bindings() {
        let mut app = test_app();
        app.show_help = true;
        let screen = draw(&app, 100, 40);
        assert!(screen.contains("Mark article as read"));
    }
}
