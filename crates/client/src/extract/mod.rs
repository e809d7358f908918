//! Single-page text extraction.
//!
//! ### Pipeline
//! Fetch → Validate → Parse → Extract → Normalize.
//!
//! - Fetch: [`FetchClient`] with per-call timeout and retry budget.
//! - Validate: status handling happens in the fetch layer; here the content
//!   type decides between the HTML path, the plain-text path, or a parse error.
//! - Parse/Extract: charset detection, then visible text from `<body>`.
//! - Normalize: whitespace runs collapse to one space, trimmed.
//!
//! ### Batches
//! [`TextExtractor::extract_batch`] runs many URLs under a concurrency limit
//! and records a success or an error per URL.
//!
//! ### Sharing
//! [`TextExtractor`] holds an immutable client and config; clone it or share a
//! reference across tasks.

pub mod batch;
pub mod charset;
pub mod content;
pub mod normalize;
pub mod text;

pub use batch::{BatchItem, BatchItemStatus, BatchOptions, BatchOutput, BatchSummary};
pub use charset::{CharsetSource, DecodedBody, decode_body, detect_charset};
pub use content::ContentKind;
pub use normalize::collapse_whitespace;
pub use text::{PageText, extract_visible_text};

use std::time::Duration;

use chrono::{DateTime, Utc};
use pagetext_core::{AppConfig, Error};
use serde::Serialize;

use crate::fetch::{FetchClient, FetchConfig, RetryPolicy};

/// Per-call overrides for [`TextExtractor::extract_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Per-attempt timeout; falls back to the client's configured timeout.
    pub timeout: Option<Duration>,
    /// Retries after the first attempt; falls back to the configured policy.
    pub retries: Option<u32>,
}

/// Result of a successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// The URL requested, canonicalized
    pub url: String,
    /// The URL after redirects
    pub final_url: String,
    /// Always true; failures are returned as errors
    pub success: bool,
    /// Normalized visible text
    pub text: String,
    /// Normalized `<title>`, if present
    pub title: Option<String>,
    /// HTTP status of the final response
    pub status: u16,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Encoding used to decode the body
    pub charset: String,
    /// HTTP attempts made, including the successful one
    pub attempts: u32,
    /// When the response was received
    pub fetched_at: DateTime<Utc>,
    /// Duration of the successful attempt in milliseconds
    pub fetch_ms: u64,
}

/// Text extracted from a response body, before request metadata is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBody {
    /// Normalized `<title>`; always `None` outside the HTML path
    pub title: Option<String>,
    /// Normalized visible text
    pub text: String,
    /// WHATWG name of the encoding used
    pub charset: &'static str,
    /// How the body was interpreted
    pub kind: ContentKind,
}

/// Turn a raw body into normalized text.
///
/// Never fails on malformed bytes; fails with `Error::Parse` only when the
/// body is binary.
pub fn extract_body(bytes: &[u8], content_type: Option<&str>) -> Result<ExtractedBody, Error> {
    let kind = content::resolve(content_type, bytes)?;
    let decoded = decode_body(bytes, content_type);

    tracing::debug!(
        ?kind,
        encoding = decoded.encoding.name(),
        source = ?decoded.source,
        "decoded body"
    );

    let (title, text) = match kind {
        ContentKind::Html => {
            let page = extract_visible_text(&decoded.text);
            (page.title, page.text)
        }
        _ => (None, collapse_whitespace(&decoded.text)),
    };

    Ok(ExtractedBody { title, text, charset: decoded.encoding.name(), kind })
}

/// Fetches pages and extracts their visible text.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    client: FetchClient,
}

impl TextExtractor {
    /// Create an extractor with its own HTTP client.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        Ok(Self { client: FetchClient::new(config)? })
    }

    /// Create an extractor from loaded application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(FetchConfig::from(config))
    }

    /// Extract with the configured timeout and retry budget.
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult, Error> {
        self.extract_with(url, ExtractOptions::default()).await
    }

    /// Extract with per-call timeout and retry overrides.
    ///
    /// Invalid input fails before any network activity.
    pub async fn extract_with(&self, url: &str, options: ExtractOptions) -> Result<ExtractionResult, Error> {
        let url = self.client.parse_url(url)?;

        let config = self.client.config();
        let timeout = options.timeout.unwrap_or(config.timeout);
        if timeout.is_zero() {
            return Err(Error::InvalidInput("timeout must be greater than zero".into()));
        }

        let policy = RetryPolicy { max_retries: options.retries.unwrap_or(config.retry.max_retries), ..config.retry };

        let response = self.client.fetch(&url, timeout, &policy).await?;
        let fetched_at = Utc::now();

        let body = extract_body(&response.bytes, response.content_type.as_deref())?;

        tracing::info!(
            url = %response.url,
            final_url = %response.final_url,
            attempts = response.attempts,
            chars = body.text.chars().count(),
            charset = body.charset,
            "extracted page text"
        );

        Ok(ExtractionResult {
            url: response.url.to_string(),
            final_url: response.final_url.to_string(),
            success: true,
            text: body.text,
            title: body.title,
            status: response.status.as_u16(),
            content_type: response.content_type,
            charset: body.charset.to_string(),
            attempts: response.attempts,
            fetched_at,
            fetch_ms: response.fetch_ms,
        })
    }

    /// Get reference to the underlying fetch client.
    pub fn client(&self) -> &FetchClient {
        &self.client
    }
}

/// Fetch `url` and return its visible text.
///
/// Convenience wrapper that builds a default [`TextExtractor`] per call;
/// reuse an extractor when making many calls.
pub async fn extract(url: &str, timeout: Duration, retries: u32) -> Result<ExtractionResult, Error> {
    let extractor = TextExtractor::new(FetchConfig::default())?;
    extractor.extract_with(url, ExtractOptions { timeout: Some(timeout), retries: Some(retries) }).await
}
