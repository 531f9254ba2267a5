//! Core types for external supplier search.

use serde::{Deserialize, Serialize};

/// A web search request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebQuery {
    /// The search query string.
    pub query: String,
    /// Maximum number of hits to return.
    pub max_results: usize,
    /// Region filter as a two-letter code (e.g., "vn", "cn").
    pub region: Option<String>,
}

impl WebQuery {
    /// Create a new query with default settings.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 10,
            region: None,
        }
    }

    /// Set max results.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set region filter.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Generate a cache key for this query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "web:{}:{}:{}",
            self.query.to_lowercase(),
            self.max_results,
            self.region.as_deref().unwrap_or("any"),
        )
    }
}

/// A single web search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebHit {
    /// Title of the page.
    pub title: String,
    /// URL of the page.
    pub url: String,
    /// Snippet.
    pub description: String,
    /// Source domain.
    pub domain: String,
    /// 1-based position in the engine's result list.
    pub position: usize,
    /// Engine that returned the hit.
    pub engine: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_query_builder() {
        let query = WebQuery::new("hoodie Vietnam manufacturer")
            .with_max_results(20)
            .with_region("vn");

        assert_eq!(query.query, "hoodie Vietnam manufacturer");
        assert_eq!(query.max_results, 20);
        assert_eq!(query.region, Some("vn".to_string()));
    }

    #[test]
    fn test_cache_key_is_case_insensitive() {
        let a = WebQuery::new("Hoodie Vietnam").cache_key();
        let b = WebQuery::new("hoodie vietnam").cache_key();
        assert_eq!(a, b);
        assert!(a.starts_with("web:"));
    }
}
