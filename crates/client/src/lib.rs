//! Client code for pagetext.
//!
//! This crate provides the HTTP fetch pipeline, charset detection and
//! visible-text extraction used by the CLI.

pub mod extract;
pub mod fetch;

pub use extract::{
    BatchItem, BatchItemStatus, BatchOptions, BatchOutput, BatchSummary, ContentKind, ExtractOptions, ExtractedBody,
    ExtractionResult, PageText, TextExtractor, collapse_whitespace, extract, extract_body, extract_visible_text,
};

pub use fetch::{FetchClient, FetchConfig, FetchResponse, RetryPolicy};

pub use pagetext_core::Error;
