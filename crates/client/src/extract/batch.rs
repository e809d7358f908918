//! Batch extraction over many URLs.
//!
//! Each URL is an independent [`TextExtractor::extract_with`] call running
//! under a shared concurrency limit. One URL failing never fails the batch;
//! its error is recorded on its own [`BatchItem`].

use std::sync::Arc;

use pagetext_core::Error;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{ExtractOptions, ExtractionResult, TextExtractor};

/// Upper bound on `max_concurrency`.
pub const MAX_CONCURRENCY: usize = 16;

/// Options for [`TextExtractor::extract_batch`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Per-URL timeout and retry overrides.
    pub extract: ExtractOptions,

    /// Maximum number of URLs in flight (default: 4, max: 16).
    pub max_concurrency: usize,

    /// Stop at the first failure; unfinished URLs are dropped from the output.
    pub fail_fast: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { extract: ExtractOptions::default(), max_concurrency: 4, fail_fast: false }
    }
}

/// Batch item status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchItemStatus {
    /// Fetched and extracted.
    Success,
    /// Failed validation, fetch or extraction.
    Failed,
}

/// Outcome for one URL of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// The URL as given.
    pub url: String,
    /// Status of this item.
    pub status: BatchItemStatus,
    /// The extraction result (if status is Success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    /// Error message (if status is Failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    fn new(url: String, outcome: Result<ExtractionResult, Error>) -> Self {
        match outcome {
            Ok(result) => Self { url, status: BatchItemStatus::Success, result: Some(result), error: None },
            Err(err) => Self { url, status: BatchItemStatus::Failed, result: None, error: Some(err.to_string()) },
        }
    }
}

/// Batch summary statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// URLs submitted.
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    /// URLs abandoned by `fail_fast`.
    pub skipped: u32,
}

/// Output of [`TextExtractor::extract_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    /// Individual results, in input order.
    pub results: Vec<BatchItem>,
    pub summary: BatchSummary,
}

impl TextExtractor {
    /// Extract every URL in `urls`, recording success or failure per URL.
    ///
    /// Fails as a whole only on an empty URL list or a zero concurrency limit.
    pub async fn extract_batch<I, S>(&self, urls: I, options: BatchOptions) -> Result<BatchOutput, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Err(Error::InvalidInput("urls cannot be empty".into()));
        }
        if options.max_concurrency == 0 {
            return Err(Error::InvalidInput("max_concurrency must be at least 1".into()));
        }

        let total = urls.len() as u32;
        let semaphore = Arc::new(Semaphore::new(options.max_concurrency.min(MAX_CONCURRENCY)));
        let mut join_set = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Client(format!("batch semaphore closed: {e}")))?;
            let extractor = self.clone();
            let extract = options.extract;

            join_set.spawn(async move {
                let _permit = permit;
                let outcome = extractor.extract_with(&url, extract).await;
                (index, BatchItem::new(url, outcome))
            });
        }

        let mut indexed = Vec::with_capacity(total as usize);
        let mut succeeded = 0u32;
        let mut failed = 0u32;

        while let Some(joined) = join_set.join_next().await {
            let (index, item) = joined.map_err(|e| Error::Client(format!("batch task failed: {e}")))?;

            match item.status {
                BatchItemStatus::Success => succeeded += 1,
                BatchItemStatus::Failed => {
                    failed += 1;
                    tracing::debug!(url = %item.url, error = ?item.error, "batch item failed");
                }
            }
            indexed.push((index, item));

            if options.fail_fast && failed > 0 {
                join_set.shutdown().await;
                break;
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<BatchItem> = indexed.into_iter().map(|(_, item)| item).collect();
        let summary = BatchSummary { total, succeeded, failed, skipped: total - succeeded - failed };

        tracing::info!(total, succeeded, failed, skipped = summary.skipped, "batch extraction finished");

        Ok(BatchOutput { results, summary })
    }
}
