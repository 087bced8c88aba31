//! Background task event processing.
//!
//! Applies the results of backend calls to the session and publishes the
//! user-visible notification for each failure.

use crate::app::{
    App, AppEvent, ERR_CLEAR_HISTORY, ERR_FETCH_HISTORY, ERR_FETCH_RECOMMENDATIONS,
    ERR_MARK_READ, ERR_RESET_RECOMMENDATIONS,
};
use crate::session::FetchOutcome;
use tokio::sync::mpsc;

/// Handle an event reported by a background task.
///
/// `event_tx` is needed because some results start new work: a finished
/// mark-read and a successful reset both refetch recommendations.
pub fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::RecommendationsLoaded { generation, result } => {
            match app.session.finish_recommendation_fetch(generation, result) {
                FetchOutcome::Applied { count } => {
                    tracing::debug!(generation, count, "Applied recommendations");
                    app.clamp_selections();
                }
                FetchOutcome::Stale => {
                    tracing::debug!(generation, "Discarded stale recommendations");
                }
                FetchOutcome::Failed(e) => {
                    tracing::error!(generation, error = %e, "Failed to fetch recommendations");
                    app.set_error(ERR_FETCH_RECOMMENDATIONS);
                }
            }
        }

        AppEvent::HistoryLoaded(Ok(entries)) => {
            tracing::debug!(count = entries.len(), "Loaded user history");
            app.session.set_history(entries);
            app.clamp_selections();
        }
        AppEvent::HistoryLoaded(Err(e)) => {
            tracing::error!(error = %e, "Failed to fetch user history");
            app.set_error(ERR_FETCH_HISTORY);
        }

        AppEvent::MarkReadFinished { link, result } => {
            if let Err(e) = result {
                tracing::error!(link = %link, error = %e, "Failed to mark article as read");
                app.set_error(ERR_MARK_READ);
                if app.rollback_failed_mark_read() && app.session.rollback_read(&link) {
                    tracing::info!(link = %link, "Rolled back local mark-read");
                }
            }
            // Refetch either way so the new read-set is reflected
            app.request_recommendations(event_tx);
        }

        AppEvent::HistoryCleared(Ok(())) => {
            tracing::info!("Cleared user history");
            app.session.clear_history_view();
            app.clamp_selections();
            app.set_status("History cleared");
        }
        AppEvent::HistoryCleared(Err(e)) => {
            tracing::error!(error = %e, "Failed to clear user history");
            app.set_error(ERR_CLEAR_HISTORY);
        }

        AppEvent::RecommendationsReset(Ok(())) => {
            tracing::info!("Reset server-side recommendations");
            app.set_status("Recommendations reset");
            app.request_recommendations(event_tx);
        }
        AppEvent::RecommendationsReset(Err(e)) => {
            tracing::error!(error = %e, "Failed to reset recommendations");
            app.set_error(ERR_RESET_RECOMMENDATIONS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Article, HistoryEntry, RecommendationClient};
    use crate::app::StatusKind;
    use crate::config::Config;
    use crate::session::Session;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn test_app(config: &Config) -> App {
        let client =
            RecommendationClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Session::new("user_123"), client, config)
    }

    fn status_text(app: &App) -> Option<&str> {
        app.status_message.as_ref().map(|m| &*m.text)
    }

    #[tokio::test]
    async fn test_failed_fetch_publishes_error_and_keeps_list() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        let first = app.session.begin_recommendation_fetch();
        handle_app_event(
            &mut app,
            AppEvent::RecommendationsLoaded {
                generation: first.generation,
                result: Ok(vec![Article::titled("A")]),
            },
            &tx,
        );

        let second = app.session.begin_recommendation_fetch();
        handle_app_event(
            &mut app,
            AppEvent::RecommendationsLoaded {
                generation: second.generation,
                result: Err(ApiError::Format("`articles` is not an array".into())),
            },
            &tx,
        );

        assert_eq!(status_text(&app), Some(ERR_FETCH_RECOMMENDATIONS));
        assert_eq!(app.session.recommendations().len(), 1);
        assert!(!app.session.is_loading());
    }

    #[tokio::test]
    async fn test_stale_failure_is_silent() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        let older = app.session.begin_recommendation_fetch();
        let newer = app.session.begin_recommendation_fetch();

        handle_app_event(
            &mut app,
            AppEvent::RecommendationsLoaded {
                generation: newer.generation,
                result: Ok(vec![Article::titled("new")]),
            },
            &tx,
        );
        handle_app_event(
            &mut app,
            AppEvent::RecommendationsLoaded {
                generation: older.generation,
                result: Err(ApiError::HttpStatus(500)),
            },
            &tx,
        );

        assert!(app.status_message.is_none());
        assert_eq!(
            app.session.recommendations()[0].display_title(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_history_failure() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        handle_app_event(&mut app, AppEvent::HistoryLoaded(Err(ApiError::Timeout)), &tx);
        assert_eq!(status_text(&app), Some(ERR_FETCH_HISTORY));
        assert!(app.session.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_cleared() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        app.session.set_history(vec![HistoryEntry::new("old")]);
        app.session.mark_read_locally("https://news.example/a");

        handle_app_event(&mut app, AppEvent::HistoryCleared(Ok(())), &tx);

        assert!(app.session.history().is_empty());
        assert_eq!(app.session.read_set().len(), 1);
        assert_eq!(status_text(&app), Some("History cleared"));
        assert_eq!(
            app.status_message.as_ref().map(|m| m.kind),
            Some(StatusKind::Info)
        );
    }

    #[tokio::test]
    async fn test_clear_history_failure_keeps_view() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        app.session.set_history(vec![HistoryEntry::new("old")]);

        handle_app_event(
            &mut app,
            AppEvent::HistoryCleared(Err(ApiError::HttpStatus(500))),
            &tx,
        );

        assert_eq!(app.session.history().len(), 1);
        assert_eq!(status_text(&app), Some(ERR_CLEAR_HISTORY));
    }

    #[tokio::test]
    async fn test_mark_read_failure_keeps_link_and_refetches() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        app.session.mark_read_locally("https://news.example/a");

        handle_app_event(
            &mut app,
            AppEvent::MarkReadFinished {
                link: "https://news.example/a".to_string(),
                result: Err(ApiError::HttpStatus(500)),
            },
            &tx,
        );

        assert_eq!(status_text(&app), Some(ERR_MARK_READ));
        assert!(app.session.read_set().contains("https://news.example/a"));
        assert!(app.session.is_loading());
    }

    #[tokio::test]
    async fn test_mark_read_failure_rolls_back_when_configured() {
        let config = Config {
            rollback_failed_mark_read: true,
            ..Config::default()
        };
        let mut app = test_app(&config);
        let (tx, _rx) = mpsc::channel(4);
        app.session.mark_read_locally("https://news.example/a");

        handle_app_event(
            &mut app,
            AppEvent::MarkReadFinished {
                link: "https://news.example/a".to_string(),
                result: Err(ApiError::Timeout),
            },
            &tx,
        );

        assert!(app.session.read_set().is_empty());
        assert!(app.session.is_loading());
    }

    #[tokio::test]
    async fn test_mark_read_success_refetches_silently() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);
        app.session.mark_read_locally("https://news.example/a");

        handle_app_event(
            &mut app,
            AppEvent::MarkReadFinished {
                link: "https://news.example/a".to_string(),
                result: Ok(()),
            },
            &tx,
        );

        assert!(app.status_message.is_none());
        assert!(app.session.is_loading());
    }

    #[tokio::test]
    async fn test_reset_outcomes() {
        let mut app = test_app(&Config::default());
        let (tx, _rx) = mpsc::channel(4);

        handle_app_event(
            &mut app,
            AppEvent::RecommendationsReset(Err(ApiError::HttpStatus(404))),
            &tx,
        );
        assert_eq!(status_text(&app), Some(ERR_RESET_RECOMMENDATIONS));
        assert!(!app.session.is_loading());

        handle_app_event(&mut app, AppEvent::RecommendationsReset(Ok(())), &tx);
        assert_eq!(status_text(&app), Some("Recommendations reset"));
        assert!(app.session.is_loading());
    }
}
