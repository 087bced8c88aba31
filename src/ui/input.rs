//! Input handling for the TUI.
//!
//! Keys are resolved through the keybinding registry using the focused panel
//! as context, then dispatched to the `App` operations.

use crate::app::{App, AppEvent, Focus, ERR_ARTICLE_NO_LINK};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::util::validate_url_for_open;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::Action;

fn focus_to_context(focus: Focus) -> KbContext {
    match focus {
        Focus::Recommendations => KbContext::Recommendations,
        Focus::History => KbContext::History,
    }
}

/// Main input dispatch function.
pub fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Raw mode swallows SIGINT, so Ctrl+C arrives as a key
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    // Help overlay captures all keys when visible
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    let context = focus_to_context(app.focus);
    let Some(action) = app.keybindings.action_for_key(code, modifiers, context) else {
        return Ok(Action::Continue);
    };

    match action {
        KbAction::Quit => return Ok(Action::Quit),
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::CycleFocus => app.cycle_focus(),
        KbAction::Dismiss => {
            app.dismiss_status();
        }
        KbAction::MarkRead => app.mark_selected_read(event_tx),
        KbAction::LoadMore => {
            if !app.load_more(event_tx) {
                tracing::debug!("Load more ignored while a fetch is outstanding");
            }
        }
        KbAction::Reload => app.request_recommendations(event_tx),
        KbAction::ClearHistory => app.clear_history(event_tx),
        KbAction::ResetRecommendations => app.reset_recommendations(event_tx),
        KbAction::OpenInBrowser => open_selected(app),
        KbAction::CycleTheme => app.cycle_theme(),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
    }

    Ok(Action::Continue)
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

fn open_selected(app: &mut App) {
    let Some(article) = app.selected_article() else {
        return;
    };
    let Some(link) = article.link.clone() else {
        app.set_error(ERR_ARTICLE_NO_LINK);
        return;
    };

    // Validate before handing the string to the OS opener
    if let Err(e) = validate_url_for_open(&link) {
        app.set_error(e.to_string());
    } else if let Err(e) = open::that(&link) {
        tracing::error!(link = %link, error = %e, "Failed to open browser");
        app.set_error(format!("Failed to open browser: {}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Article, RecommendationClient};
    use crate::config::Config;
    use crate::session::Session;
    use std::time::Duration;

    fn test_app() -> App {
        let client =
            RecommendationClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Session::new("user_123"), client, &Config::default())
    }

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);
        assert_eq!(press(&mut app, KeyCode::Char('q'), &tx), Action::Quit);
        assert_eq!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx).unwrap(),
            Action::Quit
        );
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, KeyCode::Char('?'), &tx);
        assert!(app.show_help);

        // 'q' closes the overlay instead of quitting
        assert_eq!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue);
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_esc_dismisses_notification() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);
        app.set_error("Error fetching recommendations");
        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_mark_read_ignored_in_history_panel() {
        let mut app = test_app();
        let pending = app.session.begin_recommendation_fetch();
        app.session.finish_recommendation_fetch(
            pending.generation,
            Ok(vec![Article::titled("A").with_link("https://news.example/a")]),
        );
        let (tx, _rx) = mpsc::channel(4);

        press(&mut app, KeyCode::Tab, &tx);
        press(&mut app, KeyCode::Char('m'), &tx);
        assert!(app.session.read_set().is_empty());

        press(&mut app, KeyCode::Tab, &tx);
        press(&mut app, KeyCode::Char('m'), &tx);
        assert_eq!(app.session.read_set().links(), ["https://news.example/a"]);
    }

    #[tokio::test]
    async fn test_open_without_link_sets_error() {
        let mut app = test_app();
        let pending = app.session.begin_recommendation_fetch();
        app.session
            .finish_recommendation_fetch(pending.generation, Ok(vec![Article::titled("A")]));
        let (tx, _rx) = mpsc::channel(4);

        press(&mut app, KeyCode::Char('o'), &tx);
        assert_eq!(
            app.status_message.as_ref().map(|m| &*m.text),
            Some(ERR_ARTICLE_NO_LINK)
        );
    }

    #[tokio::test]
    async fn test_open_rejects_non_http_link() {
        let mut app = test_app();
        let pending = app.session.begin_recommendation_fetch();
        app.session.finish_recommendation_fetch(
            pending.generation,
            Ok(vec![Article::titled("A").with_link("file:///etc/passwd")]),
        );
        let (tx, _rx) = mpsc::channel(4);

        press(&mut app, KeyCode::Char('o'), &tx);
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_load_more_key_advances_page() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, KeyCode::Char('n'), &tx);
        assert_eq!(app.session.page(), 2);
        assert!(app.session.is_loading());

        // Second press while loading is a no-op
        press(&mut app, KeyCode::Char('n'), &tx);
        assert_eq!(app.session.page(), 2);
    }

    #[tokio::test]
    async fn test_shift_c_clears_history() {
        let mut app = test_app();
        let (tx, mut rx) = mpsc::channel(4);

        handle_input(&mut app, KeyCode::Char('C'), KeyModifiers::SHIFT, &tx).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("clear history task should report back")
            .unwrap();
        assert!(matches!(event, AppEvent::HistoryCleared(_)));
    }

    #[tokio::test]
    async fn test_shift_t_cycles_theme() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);
        let before = app.theme_variant;

        handle_input(&mut app, KeyCode::Char('T'), KeyModifiers::SHIFT, &tx).unwrap();
        assert_ne!(app.theme_variant, before);
    }
}
