//! Wire types for the recommendation service.
//!
//! Articles arrive in two vocabularies: the dataset fields (`headline`,
//! `short_description`/`summary`, `link`) and the display fields (`title`,
//! `description`, `url`). Both deserialize into the same [`Article`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Articles
// ============================================================================

/// A recommended article as received from the backend. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawArticle")]
pub struct Article {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reference link. This is the identity used by the read-set.
    pub link: Option<String>,
    pub external_id: Option<String>,
    pub category: Option<String>,
}

impl Article {
    /// Article with just a title, used by tests and placeholders.
    pub fn titled(title: &str) -> Self {
        Self {
            id: None,
            title: Some(title.to_string()),
            description: None,
            link: None,
            external_id: None,
            category: None,
        }
    }

    /// Builder-style setter for the link.
    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}

/// Permissive mirror of every field name the backend has been seen to send.
///
/// Fields are taken as raw values so one mistyped field (`"category": 5`)
/// degrades that field instead of rejecting the whole page.
#[derive(Deserialize)]
struct RawArticle {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "_id")]
    object_id: Option<Value>,
    #[serde(default)]
    external_id: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    headline: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    summary: Option<Value>,
    #[serde(default)]
    short_description: Option<Value>,
    #[serde(default)]
    link: Option<Value>,
    #[serde(default)]
    url: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
}

/// Identifiers may be strings or numbers; anything else is dropped.
fn id_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text fields: strings, or scalars rendered as text. Blank counts as missing.
fn non_empty(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Self {
            id: id_string(raw.id),
            title: non_empty(raw.title).or_else(|| non_empty(raw.headline)),
            description: non_empty(raw.description)
                .or_else(|| non_empty(raw.summary))
                .or_else(|| non_empty(raw.short_description)),
            link: non_empty(raw.link).or_else(|| non_empty(raw.url)),
            external_id: id_string(raw.external_id).or_else(|| id_string(raw.object_id)),
            category: non_empty(raw.category),
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// One line of reading history. Opaque to the client: only displayed.
///
/// Accepted shapes: a plain string, a `{link, headline}` record, or a
/// `[link, headline]` pair. The headline wins over the link when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct HistoryEntry(String);

impl HistoryEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Value> for HistoryEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self(s),
            Value::Object(map) => {
                let field = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.trim().is_empty())
                        .map(str::to_string)
                };
                let label = field("headline")
                    .or_else(|| field("title"))
                    .or_else(|| field("link"))
                    .unwrap_or_else(|| Value::Object(map.clone()).to_string());
                Self(label)
            }
            Value::Array(parts) => {
                let part = |i: usize| {
                    parts
                        .get(i)
                        .and_then(Value::as_str)
                        .filter(|s| !s.trim().is_empty())
                        .map(str::to_string)
                };
                let label = part(1)
                    .or_else(|| part(0))
                    .unwrap_or_else(|| Value::Array(parts.clone()).to_string());
                Self(label)
            }
            other => Self(other.to_string()),
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

/// Body of `POST /recommendations/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    /// Read-set links in insertion order.
    pub user_read_articles: Vec<String>,
    pub page: u32,
}

/// Body shared by the user-only endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct UserBody<'a> {
    pub user_id: &'a str,
}

/// Body of `POST /mark_read`.
#[derive(Debug, Serialize)]
pub(crate) struct MarkReadBody<'a> {
    pub user_id: &'a str,
    pub article_link: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_dataset_vocabulary() {
        let article: Article = serde_json::from_value(json!({
            "headline": "Rust 2.0 announced",
            "short_description": "Not really.",
            "link": "https://news.example.com/rust",
            "category": "TECH"
        }))
        .unwrap();

        assert_eq!(article.title.as_deref(), Some("Rust 2.0 announced"));
        assert_eq!(article.description.as_deref(), Some("Not really."));
        assert_eq!(article.link.as_deref(), Some("https://news.example.com/rust"));
        assert_eq!(article.category.as_deref(), Some("TECH"));
    }

    #[test]
    fn test_display_vocabulary() {
        let article: Article = serde_json::from_value(json!({
            "id": 42,
            "title": "A",
            "description": "about A",
            "url": "https://example.com/a"
        }))
        .unwrap();

        assert_eq!(article.id.as_deref(), Some("42"));
        assert_eq!(article.title.as_deref(), Some("A"));
        assert_eq!(article.link.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_title_only() {
        let article: Article = serde_json::from_value(json!({"title": "A"})).unwrap();
        assert_eq!(article, Article::titled("A"));
    }

    #[test]
    fn test_blank_title_falls_back_to_headline() {
        let article: Article =
            serde_json::from_value(json!({"title": "  ", "headline": "Real"})).unwrap();
        assert_eq!(article.display_title(), "Real");
    }

    #[test]
    fn test_untitled_display() {
        let article: Article = serde_json::from_value(json!({})).unwrap();
        assert_eq!(article.display_title(), "(untitled)");
    }

    #[test]
    fn test_mongo_id_becomes_external_id() {
        let article: Article =
            serde_json::from_value(json!({"_id": "65f0c0ffee", "title": "x"})).unwrap();
        assert_eq!(article.external_id.as_deref(), Some("65f0c0ffee"));
    }

    #[test]
    fn test_mistyped_fields_degrade() {
        let article: Article = serde_json::from_value(json!({
            "title": "A",
            "category": 5,
            "description": {"nested": true},
            "link": "https://news.example.com/a"
        }))
        .unwrap();

        assert_eq!(article.title.as_deref(), Some("A"));
        assert_eq!(article.category.as_deref(), Some("5"));
        assert_eq!(article.description, None);
        assert_eq!(article.link.as_deref(), Some("https://news.example.com/a"));
    }

    #[test]
    fn test_non_object_article_is_error() {
        let result: Result<Article, _> = serde_json::from_value(json!("just a string"));
        assert!(result.is_err());
    }

    #[test]
    fn test_history_entry_shapes() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(json!([
            "plain entry",
            {"link": "https://example.com/a", "headline": "Headline A"},
            {"link": "https://example.com/b"},
            ["https://example.com/c", "Headline C"],
            ["https://example.com/d", ""],
            17
        ]))
        .unwrap();

        let labels: Vec<&str> = entries.iter().map(HistoryEntry::as_str).collect();
        assert_eq!(
            labels,
            vec![
                "plain entry",
                "Headline A",
                "https://example.com/b",
                "Headline C",
                "https://example.com/d",
                "17"
            ]
        );
    }

    #[test]
    fn test_recommendation_request_wire_shape() {
        let body = RecommendationRequest {
            user_id: "user_123".to_string(),
            user_read_articles: vec!["https://example.com/a".to_string()],
            page: 2,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "user_id": "user_123",
                "user_read_articles": ["https://example.com/a"],
                "page": 2
            })
        );
    }
}
