//! Client side of the recommendation service HTTP API.
//!
//! - `types` - articles, history entries and request bodies
//! - `client` - the reqwest-backed [`RecommendationClient`] and [`ApiError`]

mod client;
mod types;

pub use client::{ApiError, RecommendationClient};
pub use types::{Article, HistoryEntry, RecommendationRequest};
