use crate::api::{ApiError, Article, HistoryEntry, RecommendationClient};
use crate::config::Config;
use crate::keybindings::KeybindingRegistry;
use crate::session::{PendingFetch, Session};
use crate::theme::{ColorPalette, ThemeVariant};
use futures::FutureExt;
use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// ============================================================================
// User-facing messages
// ============================================================================

pub const ERR_FETCH_RECOMMENDATIONS: &str = "Error fetching recommendations";
pub const ERR_FETCH_HISTORY: &str = "Error fetching user history";
pub const ERR_MARK_READ: &str = "Error marking article as read";
pub const ERR_CLEAR_HISTORY: &str = "Error clearing user history";
pub const ERR_RESET_RECOMMENDATIONS: &str = "Error resetting recommendations";
pub const ERR_ARTICLE_NO_LINK: &str = "Article has no link";

// ============================================================================
// Focus and Status
// ============================================================================

/// Which panel has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Recommendations,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// A dismissible notification shown in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: Cow<'static, str>,
    pub kind: StatusKind,
    pub shown_at: Instant,
}

// ============================================================================
// Background Events
// ============================================================================

/// Results reported back to the UI loop by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// A recommendation fetch finished.
    ///
    /// `generation` is the number handed out when the fetch started; the
    /// session uses it to drop responses that arrive out of order.
    RecommendationsLoaded {
        generation: u64,
        result: Result<Vec<Article>, ApiError>,
    },
    HistoryLoaded(Result<Vec<HistoryEntry>, ApiError>),
    /// The remote half of a mark-read finished. The link was already added
    /// to the read-set when the task was spawned.
    MarkReadFinished {
        link: String,
        result: Result<(), ApiError>,
    },
    HistoryCleared(Result<(), ApiError>),
    RecommendationsReset(Result<(), ApiError>),
}

/// Run a future, turning a panic into an `Err` carrying the panic message.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    /// The state store. Only the UI loop mutates it.
    pub session: Session,
    client: RecommendationClient,

    pub focus: Focus,
    pub selected_recommendation: usize,
    pub selected_history: usize,

    pub theme_variant: ThemeVariant,
    pub palette: ColorPalette,
    pub keybindings: KeybindingRegistry,

    pub status_message: Option<StatusMessage>,
    notification_ttl: Duration,

    /// Set whenever state changes; the loop only draws when this is true.
    pub needs_redraw: bool,
    pub show_help: bool,
    pub help_scroll_offset: usize,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,

    rollback_failed_mark_read: bool,
    /// Every spawned backend task, aborted on drop.
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(session: Session, client: RecommendationClient, config: &Config) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, falling back to dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!("{}", warning);
        }

        Self {
            session,
            client,
            focus: Focus::Recommendations,
            selected_recommendation: 0,
            selected_history: 0,
            theme_variant,
            palette: theme_variant.palette(),
            keybindings,
            status_message: None,
            notification_ttl: config.notification_duration(),
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
            spinner_frame: 0,
            rollback_failed_mark_read: config.rollback_failed_mark_read,
            tasks: Vec::new(),
        }
    }

    pub fn rollback_failed_mark_read(&self) -> bool {
        self.rollback_failed_mark_read
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            kind: StatusKind::Info,
            shown_at: Instant::now(),
        });
    }

    pub fn set_error(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            kind: StatusKind::Error,
            shown_at: Instant::now(),
        });
    }

    /// Clear the notification once it has been visible for the configured
    /// time. Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        let expired = self
            .status_message
            .as_ref()
            .is_some_and(|m| m.shown_at.elapsed() >= self.notification_ttl);
        if expired {
            self.status_message = None;
        }
        expired
    }

    /// Returns true if there was something to dismiss.
    pub fn dismiss_status(&mut self) -> bool {
        self.status_message.take().is_some()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn selected_article(&self) -> Option<&Article> {
        self.session
            .recommendations()
            .get(self.selected_recommendation)
    }

    pub fn nav_down(&mut self) {
        match self.focus {
            Focus::Recommendations => {
                let len = self.session.recommendations().len();
                if self.selected_recommendation + 1 < len {
                    self.selected_recommendation += 1;
                }
            }
            Focus::History => {
                let len = self.session.history().len();
                if self.selected_history + 1 < len {
                    self.selected_history += 1;
                }
            }
        }
    }

    pub fn nav_up(&mut self) {
        match self.focus {
            Focus::Recommendations => {
                self.selected_recommendation = self.selected_recommendation.saturating_sub(1);
            }
            Focus::History => {
                self.selected_history = self.selected_history.saturating_sub(1);
            }
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Recommendations => Focus::History,
            Focus::History => Focus::Recommendations,
        };
    }

    /// Keep selections inside their lists after a list was replaced.
    pub fn clamp_selections(&mut self) {
        let recs = self.session.recommendations().len();
        self.selected_recommendation = self.selected_recommendation.min(recs.saturating_sub(1));
        let history = self.session.history().len();
        self.selected_history = self.selected_history.min(history.saturating_sub(1));
    }

    pub fn cycle_theme(&mut self) {
        self.theme_variant = self.theme_variant.next();
        self.palette = self.theme_variant.palette();
        self.set_status(format!("Theme: {}", self.theme_variant.name()));
    }

    // ------------------------------------------------------------------------
    // Background tasks
    // ------------------------------------------------------------------------

    /// Spawn `work` and send its event back over `tx`.
    ///
    /// A panic inside `work` is logged and converted into the event built by
    /// `on_panic`, so the UI sees it as an ordinary failure.
    fn spawn_task<F, P>(
        &mut self,
        task: &'static str,
        tx: &mpsc::Sender<AppEvent>,
        work: F,
        on_panic: P,
    ) where
        F: Future<Output = AppEvent> + Send + 'static,
        P: FnOnce(ApiError) -> AppEvent + Send + 'static,
    {
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            let event = match catch_task_panic(work).await {
                Ok(event) => event,
                Err(panic_msg) => {
                    tracing::error!(task, error = %panic_msg, "Background task panicked");
                    on_panic(ApiError::TaskFailed(panic_msg))
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(task, error = %e, "Channel send failed (receiver dropped)");
            }
        });

        self.tasks.retain(|h| !h.is_finished());
        self.tasks.push(handle);
    }

    /// Session start: load the history once, then the first page.
    pub fn start(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.load_history(tx);
        self.request_recommendations(tx);
    }

    pub fn load_history(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let client = self.client.clone();
        let user_id = self.session.user_id().to_string();
        tracing::debug!(user_id = %user_id, "Fetching user history");

        self.spawn_task(
            "user_history",
            tx,
            async move { AppEvent::HistoryLoaded(client.user_history(&user_id).await) },
            |e| AppEvent::HistoryLoaded(Err(e)),
        );
    }

    /// Fetch the current page with the current read-set.
    ///
    /// Never cancels an outstanding fetch; the session sorts out ordering when
    /// the results come back.
    pub fn request_recommendations(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let pending = self.session.begin_recommendation_fetch();
        self.spawn_recommendation_fetch(pending, tx);
    }

    /// Advance to the next page. Returns false (and does nothing) while a
    /// fetch is outstanding.
    pub fn load_more(&mut self, tx: &mpsc::Sender<AppEvent>) -> bool {
        match self.session.load_more() {
            Some(pending) => {
                self.selected_recommendation = 0;
                self.spawn_recommendation_fetch(pending, tx);
                true
            }
            None => false,
        }
    }

    fn spawn_recommendation_fetch(
        &mut self,
        pending: PendingFetch,
        tx: &mpsc::Sender<AppEvent>,
    ) {
        let client = self.client.clone();
        let generation = pending.generation;
        tracing::debug!(
            generation,
            page = pending.request.page,
            read = pending.request.user_read_articles.len(),
            "Fetching recommendations"
        );

        self.spawn_task(
            "recommendations",
            tx,
            async move {
                AppEvent::RecommendationsLoaded {
                    generation,
                    result: client.recommendations(&pending.request).await,
                }
            },
            move |e| AppEvent::RecommendationsLoaded {
                generation,
                result: Err(e),
            },
        );
    }

    /// Mark the selected recommendation read.
    pub fn mark_selected_read(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let Some(article) = self.selected_article() else {
            return;
        };
        let link = article.link.clone();
        self.mark_read(link.as_deref(), tx);
    }

    /// Optimistically add `link` to the read-set and send the remote write.
    ///
    /// A link that is already read is a no-op. The recommendation refetch
    /// happens when `MarkReadFinished` comes back, whatever its outcome.
    pub fn mark_read(&mut self, link: Option<&str>, tx: &mpsc::Sender<AppEvent>) {
        let Some(link) = link else {
            self.set_error(ERR_ARTICLE_NO_LINK);
            return;
        };
        if !self.session.mark_read_locally(link) {
            tracing::debug!(link = %link, "Article already marked read");
            return;
        }

        let client = self.client.clone();
        let user_id = self.session.user_id().to_string();
        let link = link.to_string();
        let link_for_panic = link.clone();
        tracing::debug!(link = %link, "Marking article read");

        self.spawn_task(
            "mark_read",
            tx,
            async move {
                let result = client.mark_read(&user_id, &link).await;
                AppEvent::MarkReadFinished { link, result }
            },
            move |e| AppEvent::MarkReadFinished {
                link: link_for_panic,
                result: Err(e),
            },
        );
    }

    pub fn clear_history(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let client = self.client.clone();
        let user_id = self.session.user_id().to_string();
        tracing::debug!(user_id = %user_id, "Clearing user history");

        self.spawn_task(
            "clear_history",
            tx,
            async move { AppEvent::HistoryCleared(client.clear_history(&user_id).await) },
            |e| AppEvent::HistoryCleared(Err(e)),
        );
    }

    /// Ask the backend to forget what it has already recommended.
    pub fn reset_recommendations(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let client = self.client.clone();
        let user_id = self.session.user_id().to_string();
        tracing::debug!(user_id = %user_id, "Resetting recommendations");

        self.spawn_task(
            "refresh",
            tx,
            async move {
                AppEvent::RecommendationsReset(client.reset_recommendations(&user_id).await)
            },
            |e| AppEvent::RecommendationsReset(Err(e)),
        );
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort all in-flight requests when the App goes away (on quit).
impl Drop for App {
    fn drop(&mut self) {
        let mut aborted = 0usize;
        for handle in self.tasks.drain(..) {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            tracing::debug!(aborted, "Aborted background tasks on App drop");
        }
    }
}
