//! HTTP fetch pipeline with timeout, retry and size limits.
//!
//! ### URL Validation
//! - Trim whitespace, require an absolute URL with an allowed scheme.
//! - Remove fragments, preserve query string.
//!
//! ### Safety Gates
//! - Per-attempt timeout enforced by the transport.
//! - Max redirects: 5 (configurable); every hop must use an allowed scheme.
//! - Max body bytes: 5MB (configurable), enforced while streaming.
//!
//! ### Retries
//! - Network failures and 5xx responses retry with exponential backoff.
//! - 4xx and everything else fail on the first attempt.

pub mod retry;
pub mod url;

use bytes::{Bytes, BytesMut};
use reqwest::Url;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use retry::RetryPolicy;
pub use self::url::{UrlError, canonicalize};

use pagetext_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pagetext/<version>")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Default per-attempt timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Schemes accepted as input (default: http, https)
    pub allowed_schemes: Vec<String>,

    /// Default retry policy (default: 2 retries, 200ms base backoff)
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
            allowed_schemes: config.allowed_schemes.clone(),
            retry: RetryPolicy {
                max_retries: config.retries,
                base_delay: config.backoff(),
                max_delay: config.max_backoff(),
            },
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Time taken by the successful attempt in milliseconds
    pub fetch_ms: u64,
    /// Total attempts including the successful one
    pub attempts: u32,
}

/// HTTP fetch client with timeout, retry and size limits.
///
/// Holds no mutable state; one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect_policy(config.max_redirects, config.allowed_schemes.clone()))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Client(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Validate and canonicalize a URL against the allowed schemes.
    pub fn parse_url(&self, input: &str) -> Result<Url, Error> {
        canonicalize(input, &self.config.allowed_schemes).map_err(Error::from)
    }

    /// Fetch a URL, retrying transient failures according to `policy`.
    ///
    /// The returned error carries the total attempt count.
    pub async fn fetch(&self, url: &Url, timeout: Duration, policy: &RetryPolicy) -> Result<FetchResponse, Error> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.fetch_once(url, timeout).await {
                Ok(mut response) => {
                    response.attempts = attempt;
                    return Ok(response);
                }
                Err(err) if policy.should_retry(&err, attempt) => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        url = %url,
                        attempt,
                        max_attempts = policy.max_attempts(),
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::debug!(url = %url, attempt, error = %err, "fetch failed");
                    return Err(err.with_attempts(attempt));
                }
            }
        }
    }

    /// Perform a single GET attempt, returning raw bytes and metadata.
    ///
    /// Non-2xx statuses are returned as `Error::HttpStatus` without reading the
    /// body. The response is dropped on every exit path, releasing the connection.
    pub async fn fetch_once(&self, url: &Url, timeout: Duration) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let request = self
            .http
            .get(url.as_str())
            .timeout(timeout)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,text/*;q=0.8,*/*;q=0.5");

        let mut response = request.send().await.map_err(classify_transport_error)?;

        let status = response.status();
        tracing::debug!("{} answered {}", url, status.as_u16());

        if !status.is_success() {
            return Err(Error::HttpStatus { status: status.as_u16(), attempts: 1 });
        }

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes as u64
        {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(classify_transport_error)? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(Error::TooLarge(format!(
                    "body exceeds {} bytes while streaming",
                    self.config.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse {
            url: url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            headers,
            fetch_ms,
            attempts: 1,
        })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// A redirect hop pointed at a scheme outside the allow-list.
#[derive(Debug, thiserror::Error)]
#[error("redirect to disallowed scheme: {0}")]
struct DisallowedRedirect(String);

/// Follow at most `max_redirects` hops, each to an allowed scheme.
fn redirect_policy(max_redirects: usize, allowed_schemes: Vec<String>) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error(format!("too many redirects (limit {max_redirects})"));
        }

        let scheme = attempt.url().scheme().to_string();
        if allowed_schemes.iter().any(|s| s.eq_ignore_ascii_case(&scheme)) {
            attempt.follow()
        } else {
            attempt.error(DisallowedRedirect(scheme))
        }
    })
}

/// Map a reqwest failure onto the error taxonomy.
fn classify_transport_error(err: reqwest::Error) -> Error {
    if let Some(disallowed) = find_source::<DisallowedRedirect>(&err) {
        return Error::InvalidInput(disallowed.to_string());
    }
    if err.is_redirect() {
        return Error::TooManyRedirects(error_chain(&err));
    }
    if err.is_builder() {
        return Error::InvalidInput(error_chain(&err));
    }

    let cause = if err.is_timeout() { format!("timed out: {}", error_chain(&err)) } else { error_chain(&err) };
    Error::Network { cause, attempts: 1 }
}

fn find_source<'a, T: std::error::Error + 'static>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a T> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(found) = inner.downcast_ref::<T>() {
            return Some(found);
        }
        source = inner.source();
    }
    None
}

/// Render an error with its sources, e.g. `error sending request: connection refused`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("pagetext/"));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.allowed_schemes, vec!["http".to_string(), "https".to_string()]);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1500, retries: 4, backoff_ms: 50, max_redirects: 1, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.retry.base_delay, Duration::from_millis(50));
        assert_eq!(config.max_redirects, 1);
    }

    #[test]
    fn test_fetch_response_fields() {
        let response = FetchResponse {
            url: Url::parse("https://example.com").unwrap(),
            final_url: Url::parse("https://example.com/redirected").unwrap(),
            status: StatusCode::OK,
            content_type: Some("text/html".to_string()),
            bytes: Bytes::new(),
            headers: header::HeaderMap::new(),
            fetch_ms: 100,
            attempts: 1,
        };

        assert_eq!(response.url.as_str(), "https://example.com/");
        assert_eq!(response.final_url.as_str(), "https://example.com/redirected");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, Some("text/html".to_string()));
        assert_eq!(response.fetch_ms, 100);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_parse_url_uses_allowed_schemes() {
        let config = FetchConfig { allowed_schemes: vec!["https".into()], ..Default::default() };
        let client = FetchClient::new(config).unwrap();
        assert!(client.parse_url("https://example.com").is_ok());
        assert!(matches!(client.parse_url("http://example.com"), Err(Error::InvalidInput(_))));
        assert!(matches!(client.parse_url("not a url"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_find_source_walks_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("redirect failed")]
        struct Wrapper(#[source] DisallowedRedirect);

        let outer = Wrapper(DisallowedRedirect("ftp".into()));
        let found = find_source::<DisallowedRedirect>(&outer);
        assert_eq!(found.map(|e| e.0.as_str()), Some("ftp"));
        assert!(find_source::<std::fmt::Error>(&outer).is_none());
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let outer = std::io::Error::other(inner);
        let message = error_chain(&outer);
        assert!(message.contains("connection refused"));
    }
}
