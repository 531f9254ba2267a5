//! External supplier discovery through a public web search engine.
//!
//! This module provides:
//! - Search engines (DuckDuckGo HTML, Brave API)
//! - A TTL result cache
//! - Deadline-aware retries

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod types;

pub use cache::WebCache;
pub use config::{WebCacheConfig, WebConfig};
pub use engines::SearchEngine;
pub use error::WebError;
pub use types::{WebHit, WebQuery};

use std::sync::Arc;

use tokio::time::Instant;

/// Web search client shared by all requests.
pub struct WebSearchClient {
    config: WebConfig,
    cache: Arc<WebCache>,
    client: reqwest::Client,
}

impl WebSearchClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: WebConfig) -> Result<Self, WebError> {
        let client = Self::build_client(&config)?;
        let cache = Arc::new(WebCache::new(config.cache.clone()));

        Ok(Self {
            config,
            cache,
            client,
        })
    }

    /// Build an HTTP client with appropriate headers and settings.
    fn build_client(config: &WebConfig) -> Result<reqwest::Client, WebError> {
        use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

        let mut headers = HeaderMap::new();

        let ua = config.random_user_agent();
        if let Ok(ua_value) = HeaderValue::from_str(&ua) {
            headers.insert(USER_AGENT, ua_value);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| WebError::HttpClient(e.to_string()))
    }

    /// Provider configuration.
    #[must_use]
    pub const fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Whether the provider is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Result cache.
    #[must_use]
    pub fn cache(&self) -> &WebCache {
        &self.cache
    }

    /// Build a query carrying the configured result limit.
    #[must_use]
    pub fn query(&self, text: impl Into<String>) -> WebQuery {
        WebQuery::new(text).with_max_results(self.config.max_results)
    }

    /// Run a search that must finish before `deadline`.
    ///
    /// Retryable failures are retried while the deadline leaves room for the
    /// backoff delay.
    ///
    /// # Errors
    /// Returns the last engine error, or [`WebError::Timeout`] once the
    /// deadline passes.
    pub async fn search(&self, query: &WebQuery, deadline: Instant) -> Result<Vec<WebHit>, WebError> {
        if !self.config.enabled {
            return Err(WebError::Disabled);
        }

        let cache_key = format!("{}:{}", self.config.engine.name(), query.cache_key());
        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!(query = %query.query, "Web cache hit");
            return Ok(cached);
        }

        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout_at(deadline, self.search_once(query)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(WebError::Timeout),
            };

            match outcome {
                Ok(hits) => {
                    self.cache.set(&cache_key, &hits);
                    return Ok(hits);
                }
                Err(err) => {
                    let delay = err.retry_delay(self.config.retry_delay());
                    let retry = match delay {
                        Some(delay) if attempt < self.config.max_retries => {
                            Instant::now() + delay < deadline
                        }
                        _ => false,
                    };
                    if !retry {
                        return Err(err);
                    }
                    attempt += 1;
                    tracing::debug!(attempt, error = %err, "Retrying web search");
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    async fn search_once(&self, query: &WebQuery) -> Result<Vec<WebHit>, WebError> {
        match self.config.engine {
            SearchEngine::DuckDuckGo => engines::duckduckgo::search(&self.client, query).await,
            SearchEngine::Brave => {
                engines::brave::search(&self.client, query, self.config.brave_api_key.as_deref())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_disabled_client_returns_immediately() {
        let client = WebSearchClient::new(WebConfig::default()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);
        let result = client.search(&client.query("hoodie"), deadline).await;
        assert!(matches!(result, Err(WebError::Disabled)));
    }

    #[tokio::test]
    async fn test_cached_hits_skip_network() {
        let config = WebConfig::new().enabled();
        let client = WebSearchClient::new(config).unwrap();
        let query = client.query("hoodie vietnam");
        let hit = WebHit {
            title: "Saigon Knit".to_string(),
            url: "https://saigonknit.vn".to_string(),
            description: String::new(),
            domain: "saigonknit.vn".to_string(),
            position: 1,
            engine: "DuckDuckGo".to_string(),
        };
        let key = format!("{}:{}", SearchEngine::DuckDuckGo.name(), query.cache_key());
        client.cache().set(&key, &[hit]);

        // An already expired deadline proves the network is never touched.
        let hits = client.search(&query, Instant::now()).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_brave_key_is_not_retried() {
        let config = WebConfig::new().enabled().with_engine(SearchEngine::Brave);
        let client = WebSearchClient::new(config).unwrap();
        let deadline = Instant::now() + Duration::from_secs(1);
        let result = client.search(&client.query("hoodie"), deadline).await;
        assert!(matches!(result, Err(WebError::ApiKeyRequired(_))));
    }
}
