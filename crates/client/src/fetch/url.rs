//! URL validation and canonicalization for fetch input.

use pagetext_core::Error;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

/// Canonicalize a URL string before any network activity.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Parse as an absolute URL (relative input is rejected)
/// 3. Check the scheme against `allowed_schemes` (case-insensitive)
/// 4. Require a host
/// 5. Remove fragment (#...), keep query string intact
pub fn canonicalize(input: &str, allowed_schemes: &[String]) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;

    let scheme = parsed.scheme();
    if !allowed_schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Err(UrlError::UnsupportedScheme(scheme.to_string()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost(trimmed.to_string()));
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
