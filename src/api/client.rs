use crate::api::types::{
    Article, HistoryEntry, MarkReadBody, RecommendationRequest, UserBody,
};
use crate::util::validate_base_url;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

const RECOMMENDATIONS_PATH: &str = "recommendations/";
const USER_HISTORY_PATH: &str = "user_history";
const MARK_READ_PATH: &str = "mark_read";
const CLEAR_HISTORY_PATH: &str = "clear_history";
const REFRESH_PATH: &str = "refresh";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid JSON in response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Unexpected response format: {0}")]
    Format(String),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}

/// Redirect policy: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt
            .previous()
            .iter()
            .any(|prev| prev.as_str() == url.as_str())
        {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// HTTP client for the recommendation backend.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so each
/// background task takes its own copy.
#[derive(Clone, Debug)]
pub struct RecommendationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RecommendationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .build()?;
        Self::with_http(http, base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// The base URL gets a trailing slash so endpoint paths resolve below any
    /// prefix it carries (`http://host/api` -> `http://host/api/mark_read`).
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let mut base_url =
            validate_base_url(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /recommendations/`: one page of articles for the user, excluding
    /// the links in `user_read_articles`.
    pub async fn recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Article>, ApiError> {
        let body = self.post_json(RECOMMENDATIONS_PATH, request).await?;
        parse_articles(body)
    }

    /// `POST /user_history`: the user's full reading history.
    pub async fn user_history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, ApiError> {
        let body = self
            .post_json(USER_HISTORY_PATH, &UserBody { user_id })
            .await?;
        parse_history(body)
    }

    /// `POST /mark_read`. Only the status code matters.
    pub async fn mark_read(&self, user_id: &str, article_link: &str) -> Result<(), ApiError> {
        self.post(
            MARK_READ_PATH,
            &MarkReadBody {
                user_id,
                article_link,
            },
        )
        .await
        .map(drop)
    }

    /// `POST /clear_history`. Only the status code matters.
    pub async fn clear_history(&self, user_id: &str) -> Result<(), ApiError> {
        self.post(CLEAR_HISTORY_PATH, &UserBody { user_id })
            .await
            .map(drop)
    }

    /// `POST /refresh`: forget the server-side recommendation memory for the user.
    pub async fn reset_recommendations(&self, user_id: &str) -> Result<(), ApiError> {
        self.post(REFRESH_PATH, &UserBody { user_id })
            .await
            .map(drop)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)?;

        tracing::trace!(url = %url, bytes = payload.len(), "POST");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let response = self.post(path, body).await?;
        let bytes = read_limited(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pull the `articles` array out of a recommendations response.
///
/// Anything other than an object holding an array of article objects is a
/// format error.
fn parse_articles(body: Value) -> Result<Vec<Article>, ApiError> {
    let items = take_array(body, "articles")?;
    items
        .into_iter()
        .map(serde_json::from_value::<Article>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::Format(format!("invalid article: {}", e)))
}

/// Pull the `history` array out of a history response.
///
/// Some backends send the `(seen, recommended)` pair of `[link, headline]`
/// lists instead of a flat list. Only the seen group is reading history.
fn parse_history(body: Value) -> Result<Vec<HistoryEntry>, ApiError> {
    let mut items = take_array(body, "history")?;
    if is_grouped_history(&items) {
        items = match items.swap_remove(0) {
            Value::Array(seen) => seen,
            _ => Vec::new(),
        };
    }
    Ok(items.into_iter().map(HistoryEntry::from).collect())
}

/// True when every item is a list of lists, i.e. groups of pairs.
fn is_grouped_history(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| matches!(item, Value::Array(group) if group.iter().all(Value::is_array)))
}

fn take_array(body: Value, field: &str) -> Result<Vec<Value>, ApiError> {
    let Value::Object(mut map) = body else {
        return Err(ApiError::Format("expected a JSON object".to_string()));
    };
    match map.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ApiError::Format(format!("`{}` is not an array", field))),
        None => Err(ApiError::Format(format!("missing `{}` field", field))),
    }
}

async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
