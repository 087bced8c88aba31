use std::net::IpAddr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("URL contains control characters")]
    ControlCharacters,
}

/// Returns true for `localhost` and loopback IP literals.
fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

/// Validate the backend origin.
///
/// Accepts http and https URLs with a host. Plain http is expected for a
/// local backend; for any other host it is allowed but logged, since
/// requests carry the user id in clear text.
///
/// ```
/// use newsrec::util::validate_base_url;
///
/// assert!(validate_base_url("http://localhost:8000").is_ok());
/// assert!(validate_base_url("https://recs.example.com/api").is_ok());
/// assert!(validate_base_url("file:///tmp/socket").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;
    if url.scheme() == "http" && !is_loopback_host(host) {
        tracing::warn!(base_url = %url, "Using plain HTTP for a non-local recommendation backend");
    }

    Ok(url)
}

/// Validate an article link before handing it to the system opener.
///
/// Links come from the backend, so anything that is not a plain http(s) URL
/// is refused rather than passed to a shell-level `open`.
pub fn validate_url_for_open(link: &str) -> Result<Url, UrlValidationError> {
    if link.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlCharacters);
    }
    let url = Url::parse(link)?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().is_none() {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}
