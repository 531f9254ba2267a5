//! Error types for the web search module.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while querying a search engine.
#[derive(Debug, Error)]
pub enum WebError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error or unexpected status.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTML parsing error.
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, retry after {0} ms")]
    RateLimited(u64),

    /// Access denied or blocked.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// API key required but not configured.
    #[error("API key required for {0}")]
    ApiKeyRequired(String),

    /// Provider is switched off.
    #[error("Web search is disabled")]
    Disabled,
}

impl WebError {
    /// Retry delay for retryable errors, given the configured base delay.
    #[must_use]
    pub const fn retry_delay(&self, base: Duration) -> Option<Duration> {
        match self {
            Self::RateLimited(ms) => Some(Duration::from_millis(*ms)),
            Self::Timeout | Self::HttpRequest(_) => Some(base),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy() {
        let base = Duration::from_millis(250);
        assert_eq!(WebError::Timeout.retry_delay(base), Some(base));
        assert_eq!(
            WebError::RateLimited(1000).retry_delay(base),
            Some(Duration::from_secs(1))
        );
        assert_eq!(WebError::AccessDenied("blocked".to_string()).retry_delay(base), None);
        assert_eq!(WebError::Disabled.retry_delay(base), None);
    }
}
