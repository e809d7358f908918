//! Unified error types for pagetext.
//!
//! Every variant renders with a stable upper-case code prefix so callers and
//! log readers can match on the kind without parsing the message.

/// Unified error type for the fetch and extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed URL or a scheme outside the allowed set.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Transport-level failure (connect, DNS, timeout, body read).
    ///
    /// `cause` is the last underlying failure once retries are exhausted.
    #[error("NETWORK_ERROR: {cause} (attempts: {attempts})")]
    Network { cause: String, attempts: u32 },

    /// The server answered with a non-2xx status.
    #[error("HTTP_STATUS: {status} (attempts: {attempts})")]
    HttpStatus { status: u16, attempts: u32 },

    /// The body cannot be treated as text.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),

    /// Response body exceeds the configured byte limit.
    #[error("TOO_LARGE: {0}")]
    TooLarge(String),

    /// Redirect chain exceeded the configured hop limit.
    #[error("TOO_MANY_REDIRECTS: {0}")]
    TooManyRedirects(String),

    /// The HTTP client could not be constructed.
    #[error("CLIENT_ERROR: {0}")]
    Client(String),
}

impl Error {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Network failures and 5xx responses are transient; everything else is
    /// reported immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { .. } => true,
            Error::HttpStatus { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Number of HTTP attempts made before this error surfaced.
    ///
    /// Errors raised before any request was sent report zero.
    pub fn attempts(&self) -> u32 {
        match self {
            Error::Network { attempts, .. } | Error::HttpStatus { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// Record the total attempt count on errors that track it.
    pub fn with_attempts(self, n: u32) -> Self {
        match self {
            Error::Network { cause, .. } => Error::Network { cause, attempts: n },
            Error::HttpStatus { status, .. } => Error::HttpStatus { status, attempts: n },
            other => other,
        }
    }
}
