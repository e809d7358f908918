//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Schemes the fetch pipeline knows how to speak.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `retries` exceeds 10
    /// - `max_backoff_ms` is smaller than `backoff_ms`
    /// - `user_agent` is empty
    /// - `allowed_schemes` is empty or names something other than http/https
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.retries > 10 {
            return Err(ConfigError::Invalid { field: "retries".into(), reason: "must not exceed 10".into() });
        }

        if self.max_backoff_ms < self.backoff_ms {
            return Err(ConfigError::Invalid {
                field: "max_backoff_ms".into(),
                reason: "must be at least backoff_ms".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.allowed_schemes.is_empty() {
            return Err(ConfigError::Invalid { field: "allowed_schemes".into(), reason: "must not be empty".into() });
        }
        if let Some(bad) = self
            .allowed_schemes
            .iter()
            .find(|s| !SUPPORTED_SCHEMES.contains(&s.to_ascii_lowercase().as_str()))
        {
            return Err(ConfigError::Invalid {
                field: "allowed_schemes".into(),
                reason: format!("unsupported scheme: {bad}"),
            });
        }

        if self.max_redirects == 0 {
            tracing::warn!("max_redirects is 0; any redirect will fail the fetch");
        }

        Ok(())
    }
}
