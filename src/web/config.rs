//! Configuration for the external web provider.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::engines::SearchEngine;

/// Configuration for the web search client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebConfig {
    /// Feature flag; a disabled provider returns nothing immediately.
    pub enabled: bool,
    /// Search engine to use.
    pub engine: SearchEngine,
    /// Sub-timeout for one recall, retries included.
    pub timeout_ms: u64,
    /// Connection timeout.
    pub connect_timeout_ms: u64,
    /// Maximum hits requested per query.
    pub max_results: usize,
    /// Maximum retries for retryable failures.
    pub max_retries: u32,
    /// Base delay between retries.
    pub retry_delay_ms: u64,
    /// User agents to rotate.
    pub user_agents: Vec<String>,
    /// Brave Search API key.
    pub brave_api_key: Option<String>,
    /// Result cache settings.
    pub cache: WebCacheConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            engine: SearchEngine::DuckDuckGo,
            timeout_ms: 4_000,
            connect_timeout_ms: 2_000,
            max_results: 10,
            max_retries: 2,
            retry_delay_ms: 250,
            user_agents: default_user_agents(),
            brave_api_key: None,
            cache: WebCacheConfig::default(),
        }
    }
}

impl WebConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the provider.
    #[must_use]
    pub const fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Set the search engine.
    #[must_use]
    pub const fn with_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Set the recall sub-timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set Brave API key.
    #[must_use]
    pub fn with_brave_api_key(mut self, key: impl Into<String>) -> Self {
        self.brave_api_key = Some(key.into());
        self
    }

    /// Recall sub-timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Base retry delay.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Get a random user agent from the rotation list.
    #[must_use]
    pub fn random_user_agent(&self) -> String {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENTS[0].to_string();
        }
        let mut rng = rand::thread_rng();
        let idx = rng.gen_range(0..self.user_agents.len());
        self.user_agents[idx].clone()
    }
}

/// Result cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebCacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// TTL for cached hits (seconds).
    pub ttl_seconds: u64,
    /// Maximum number of cached queries.
    pub max_entries: usize,
}

impl Default for WebCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 500,
        }
    }
}

const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WebConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.engine, SearchEngine::DuckDuckGo);
        assert_eq!(config.timeout(), Duration::from_secs(4));
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_config_builder() {
        let config = WebConfig::new()
            .enabled()
            .with_engine(SearchEngine::Brave)
            .with_timeout_ms(1500)
            .with_brave_api_key("test-key");

        assert!(config.enabled);
        assert_eq!(config.engine, SearchEngine::Brave);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.brave_api_key, Some("test-key".to_string()));
    }

    #[test]
    fn test_random_user_agent() {
        let mut config = WebConfig::default();
        assert!(config.random_user_agent().contains("Mozilla"));
        config.user_agents.clear();
        assert!(config.random_user_agent().contains("Mozilla"));
    }
}
