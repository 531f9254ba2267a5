//! Error types for the search subsystem.

use thiserror::Error;

use crate::web::WebError;

/// Search request and engine construction errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request is malformed and never reaches the scheduler.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Tokenizer pattern failed to compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    /// Web client could not be built.
    #[error("web provider error: {0}")]
    Web(#[from] WebError),
}

impl SearchError {
    /// Whether the error was caused by the caller rather than the service.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience result alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Failure of a single recall call. Always recovered by the scheduler.
#[derive(Debug, Error)]
pub enum RecallError {
    /// The provider did not answer before its sub-timeout.
    #[error("recall timed out after {0} ms")]
    Timeout(u64),
    /// The corpus snapshot is empty or was never loaded.
    #[error("corpus unavailable")]
    CorpusUnavailable,
    /// The blocking scan task panicked or was cancelled.
    #[error("recall task failed: {0}")]
    Task(String),
    /// External search failed.
    #[error("web search failed: {0}")]
    Web(#[from] WebError),
}

/// Corpus loading errors.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// No corpus source is configured.
    #[error("no corpus path configured")]
    NotConfigured,
    /// Reading the corpus file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The corpus file is not valid JSON for supplier records.
    #[error("corpus parse error: {0}")]
    Json(#[from] serde_json::Error),
}
