use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::RwLock,
    time::{Duration, Instant},
};

/// Key-value cache contract: get, set with a TTL, and TTL refresh.
/// Matches the surface of an external store like Redis so the in-process
/// implementation can be swapped for one without touching callers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn expire(&self, key: &str, ttl: Duration);
}

/// In-process cache with lazy expiry: entries past their deadline read as
/// misses and get evicted on the next write of the same key.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Some(value.clone()),
            _ => None,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
    }

    async fn expire(&self, key: &str, ttl: Duration) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.1 = Instant::now() + ttl;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_within_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("task:2026-08-15", "[1,2,3]".to_string(), Duration::from_secs(3600))
            .await;

        assert_eq!(
            cache.get("task:2026-08-15").await,
            Some("[1,2,3]".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("task:2026-01-01").await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_reads_as_expired() {
        let cache = MemoryCache::new();
        cache
            .set("task:2026-08-15", "[]".to_string(), Duration::ZERO)
            .await;

        assert_eq!(cache.get("task:2026-08-15").await, None);
    }

    #[tokio::test]
    async fn test_expire_can_kill_a_live_entry() {
        let cache = MemoryCache::new();
        cache
            .set("task:2026-08-15", "[]".to_string(), Duration::from_secs(3600))
            .await;
        cache.expire("task:2026-08-15", Duration::ZERO).await;

        assert_eq!(cache.get("task:2026-08-15").await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites_value_and_deadline() {
        let cache = MemoryCache::new();
        cache
            .set("k", "old".to_string(), Duration::ZERO)
            .await;
        cache
            .set("k", "new".to_string(), Duration::from_secs(60))
            .await;

        assert_eq!(cache.get("k").await, Some("new".to_string()));
    }
}
