//! Bounded last-result cache keyed by requester.
//!
//! Keeps the most recent [`SearchResult`] of each requester (a chat id, a
//! user id, whatever the host uses) so a follow-up can re-render it without
//! searching again. Uses [`moka`] for async-friendly caching with a fixed
//! capacity and TTL, so idle requesters age out on their own.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::types::SearchResult;

/// Per-engine requester cache.
#[derive(Debug, Clone)]
pub struct RequesterCache {
    inner: Option<Cache<String, Arc<SearchResult>>>,
}

impl RequesterCache {
    /// Create a cache holding up to `capacity` requesters for `ttl_seconds`.
    ///
    /// A capacity of 0 disables caching: inserts are ignored and lookups
    /// always miss.
    pub fn new(capacity: u64, ttl_seconds: u64) -> Self {
        let inner = (capacity > 0).then(|| {
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    /// Whether caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Last result stored for `requester`.
    pub async fn get(&self, requester: &str) -> Option<Arc<SearchResult>> {
        match &self.inner {
            Some(cache) => cache.get(requester).await,
            None => None,
        }
    }

    /// Replace `requester`'s last result.
    pub async fn insert(&self, requester: &str, result: Arc<SearchResult>) {
        if let Some(cache) = &self.inner {
            cache.insert(requester.to_string(), result).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    fn result(query: &str, link: &str) -> Arc<SearchResult> {
        Arc::new(SearchResult {
            query: query.into(),
            records: vec![Record::new("", link, "tlgrm")],
            elapsed: Duration::from_millis(10),
            sources_attempted: 4,
            sources_succeeded: 4,
            broadened: false,
        })
    }

    #[tokio::test]
    async fn cache_miss_returns_none() {
        let cache = RequesterCache::new(10, 600);
        assert!(cache.get("nobody").await.is_none());
    }

    #[tokio::test]
    async fn cache_insert_and_retrieve() {
        let cache = RequesterCache::new(10, 600);
        cache.insert("chat-1", result("crypto", "https://t.me/a")).await;
        let cached = cache.get("chat-1").await.expect("should be cached");
        assert_eq!(cached.query, "crypto");
        assert_eq!(cached.records.len(), 1);
    }

    #[tokio::test]
    async fn requesters_cached_independently() {
        let cache = RequesterCache::new(10, 600);
        cache.insert("chat-a", result("crypto", "https://t.me/a")).await;
        cache.insert("chat-b", result("music", "https://t.me/b")).await;
        assert_eq!(cache.get("chat-a").await.expect("a").query, "crypto");
        assert_eq!(cache.get("chat-b").await.expect("b").query, "music");
    }

    #[tokio::test]
    async fn overwrite_same_requester_updates_value() {
        let cache = RequesterCache::new(10, 600);
        cache.insert("chat-1", result("old", "https://t.me/a")).await;
        cache.insert("chat-1", result("new", "https://t.me/b")).await;
        assert_eq!(cache.get("chat-1").await.expect("cached").query, "new");
    }

    #[tokio::test]
    async fn zero_capacity_disables_cache() {
        let cache = RequesterCache::new(0, 600);
        assert!(!cache.is_enabled());
        cache.insert("chat-1", result("crypto", "https://t.me/a")).await;
        assert!(cache.get("chat-1").await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = RequesterCache::new(10, 1);
        cache.insert("chat-1", result("crypto", "https://t.me/a")).await;
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(cache.get("chat-1").await.is_none());
    }
}
