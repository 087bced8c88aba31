//! Session state store.
//!
//! One `Session` per run: the user, the current recommendation page, the
//! read-set, the history view and the pagination cursor. It is owned by
//! `App` and mutated only from the UI loop; background tasks report back
//! through events and the results are applied here.
//!
//! Recommendation fetches are sequenced. Every fetch gets a generation
//! number when it starts, and a result is applied only if its generation is
//! newer than the last resolved one. A fetch resolves when it succeeds or
//! fails, so an old response that arrives late cannot overwrite a newer page,
//! nor resurface a list the newer (failed) fetch was meant to replace.

use crate::api::{ApiError, Article, HistoryEntry, RecommendationRequest};
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// Read-set
// ============================================================================

/// Insertion-ordered set of article links marked read this session.
#[derive(Debug, Clone, Default)]
pub struct ReadSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl ReadSet {
    /// Insert a link. Returns false if it was already present.
    pub fn insert(&mut self, link: &str) -> bool {
        if self.members.contains(link) {
            return false;
        }
        self.members.insert(link.to_string());
        self.order.push(link.to_string());
        true
    }

    /// Remove a link. Only used by the opt-in mark-read rollback.
    pub fn remove(&mut self, link: &str) -> bool {
        if !self.members.remove(link) {
            return false;
        }
        self.order.retain(|l| l != link);
        true
    }

    pub fn contains(&self, link: &str) -> bool {
        self.members.contains(link)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Links in the order they were marked.
    pub fn links(&self) -> &[String] {
        &self.order
    }
}

// ============================================================================
// Fetch sequencing
// ============================================================================

/// A recommendation fetch that has been started but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub generation: u64,
    pub request: RecommendationRequest,
}

/// What happened when a fetch result was handed back to the session.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The list was replaced with `count` articles.
    Applied { count: usize },
    /// A newer fetch already resolved; this one was dropped.
    Stale,
    /// The fetch failed; the list is untouched.
    Failed(ApiError),
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    user_id: String,
    /// Current page, replaced wholesale on every applied fetch.
    recommendations: Arc<Vec<Article>>,
    read_set: ReadSet,
    history: Vec<HistoryEntry>,
    /// Pagination cursor. Starts at 1 and only moves forward.
    page: u32,
    /// Generation handed to the most recently started fetch.
    issued_generation: u64,
    /// Newest generation that has succeeded or failed (0 = none yet).
    resolved_generation: u64,
    in_flight: usize,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            recommendations: Arc::new(Vec::new()),
            read_set: ReadSet::default(),
            history: Vec::new(),
            page: 1,
            issued_generation: 0,
            resolved_generation: 0,
            in_flight: 0,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn recommendations(&self) -> &Arc<Vec<Article>> {
        &self.recommendations
    }

    pub fn read_set(&self) -> &ReadSet {
        &self.read_set
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// True while at least one recommendation fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_read(&self, article: &Article) -> bool {
        article
            .link
            .as_deref()
            .is_some_and(|link| self.read_set.contains(link))
    }

    // ------------------------------------------------------------------------
    // Recommendations
    // ------------------------------------------------------------------------

    /// Start a fetch for the current page and read-set.
    ///
    /// Marks the session as loading and returns the request to send, tagged
    /// with a fresh generation.
    pub fn begin_recommendation_fetch(&mut self) -> PendingFetch {
        self.issued_generation = self.issued_generation.wrapping_add(1);
        self.in_flight += 1;
        PendingFetch {
            generation: self.issued_generation,
            request: RecommendationRequest {
                user_id: self.user_id.clone(),
                user_read_articles: self.read_set.links().to_vec(),
                page: self.page,
            },
        }
    }

    /// Hand back the result of the fetch started with `generation`.
    pub fn finish_recommendation_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<Article>, ApiError>,
    ) -> FetchOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if generation <= self.resolved_generation {
            if let Err(e) = &result {
                tracing::debug!(generation, error = %e, "Ignoring failure of superseded fetch");
            }
            return FetchOutcome::Stale;
        }

        self.resolved_generation = generation;
        match result {
            Ok(articles) => {
                let count = articles.len();
                self.recommendations = Arc::new(articles);
                FetchOutcome::Applied { count }
            }
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    /// Advance the cursor and start a fetch for the new page.
    ///
    /// Returns `None` (and leaves the cursor alone) while a fetch is
    /// outstanding: "load more" is disabled during loading.
    pub fn load_more(&mut self) -> Option<PendingFetch> {
        if self.is_loading() {
            return None;
        }
        self.page = self.page.saturating_add(1);
        Some(self.begin_recommendation_fetch())
    }

    // ------------------------------------------------------------------------
    // Read-set
    // ------------------------------------------------------------------------

    /// Record `link` as read. Returns false if it already was.
    pub fn mark_read_locally(&mut self, link: &str) -> bool {
        self.read_set.insert(link)
    }

    /// Compensating rollback for a failed remote mark-read.
    pub fn rollback_read(&mut self, link: &str) -> bool {
        self.read_set.remove(link)
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub fn set_history(&mut self, entries: Vec<HistoryEntry>) {
        self.history = entries;
    }

    /// Empty the history view. The read-set and recommendations are untouched.
    pub fn clear_history_view(&mut self) {
        self.history.clear();
    }
}
