//! TTL cache for web search hits.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::web::config::WebCacheConfig;
use crate::web::types::WebHit;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry {
    hits: Vec<WebHit>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(hits: Vec<WebHit>, ttl: Duration) -> Self {
        Self {
            hits,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe cache of search hits keyed by query.
pub struct WebCache {
    config: WebCacheConfig,
    entries: DashMap<String, CacheEntry>,
}

impl WebCache {
    /// Create a new cache with the given configuration.
    #[must_use]
    pub fn new(config: WebCacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Get cached hits.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<WebHit>> {
        if !self.config.enabled {
            return None;
        }

        let entry = self.entries.get(key)?;
        if entry.is_expired() {
            drop(entry);
            self.entries.remove(key);
            None
        } else {
            Some(entry.hits.clone())
        }
    }

    /// Cache hits.
    pub fn set(&self, key: &str, hits: &[WebHit]) {
        if !self.config.enabled || self.config.max_entries == 0 {
            return;
        }

        self.enforce_max_entries();

        let ttl = Duration::from_secs(self.config.ttl_seconds);
        self.entries
            .insert(key.to_string(), CacheEntry::new(hits.to_vec(), ttl));
    }

    /// Number of cached queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    /// Enforce the entry limit, dropping expired entries first.
    fn enforce_max_entries(&self) {
        if self.entries.len() < self.config.max_entries {
            return;
        }

        self.cleanup_expired();

        if self.entries.len() >= self.config.max_entries {
            let to_remove = self.entries.len() - self.config.max_entries + 1;
            let keys: Vec<String> = self
                .entries
                .iter()
                .take(to_remove)
                .map(|entry| entry.key().clone())
                .collect();
            for key in keys {
                self.entries.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str) -> WebHit {
        WebHit {
            title: title.to_string(),
            url: "https://supplier.example".to_string(),
            description: "Hoodie manufacturer".to_string(),
            domain: "supplier.example".to_string(),
            position: 1,
            engine: "DuckDuckGo".to_string(),
        }
    }

    #[test]
    fn test_cache_hits() {
        let cache = WebCache::new(WebCacheConfig::default());
        cache.set("key", &[hit("Acme")]);

        let cached = cache.get("key");
        assert_eq!(cached.map(|hits| hits.len()), Some(1));
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn test_cache_disabled() {
        let cache = WebCache::new(WebCacheConfig {
            enabled: false,
            ..WebCacheConfig::default()
        });
        cache.set("key", &[hit("Acme")]);
        assert!(cache.get("key").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_expiry() {
        let cache = WebCache::new(WebCacheConfig {
            ttl_seconds: 0,
            ..WebCacheConfig::default()
        });
        cache.set("key", &[hit("Acme")]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("key").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_max_entries() {
        let cache = WebCache::new(WebCacheConfig {
            max_entries: 2,
            ..WebCacheConfig::default()
        });
        cache.set("a", &[hit("A")]);
        cache.set("b", &[hit("B")]);
        cache.set("c", &[hit("C")]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("c").is_some());
    }
}
