//! Read-result cache collaborator and its in-process implementation.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDeleteMode {
    /// Remove one key.
    Key,
    /// Remove every key of the namespace.
    Namespace,
}

/// Cache failures are never fatal to callers, so the contract has no error channel.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str, namespace: &str) -> Option<JsonValue>;
    async fn set(&self, key: &str, namespace: &str, value: JsonValue, ttl_secs: u64);
    async fn delete(&self, key: &str, namespace: &str, mode: CacheDeleteMode);
}

pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct Entry {
    value: JsonValue,
    ttl: Duration,
}

/// Each entry lives for the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<(String, String), Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &(String, String), entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Namespaced TTL cache held in process memory, keyed by `(namespace, key)`.
pub struct MemoryCache {
    entries: Cache<(String, String), Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();
        Self { entries }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str, namespace: &str) -> Option<JsonValue> {
        self.entries
            .get(&(namespace.to_string(), key.to_string()))
            .await
            .map(|entry| entry.value)
    }

    async fn set(&self, key: &str, namespace: &str, value: JsonValue, ttl_secs: u64) {
        let entry = Entry {
            value,
            ttl: Duration::from_secs(ttl_secs),
        };
        self.entries
            .insert((namespace.to_string(), key.to_string()), entry)
            .await;
    }

    async fn delete(&self, key: &str, namespace: &str, mode: CacheDeleteMode) {
        match mode {
            CacheDeleteMode::Key => {
                self.entries
                    .invalidate(&(namespace.to_string(), key.to_string()))
                    .await;
            }
            CacheDeleteMode::Namespace => {
                let namespace = namespace.to_string();
                if let Err(e) = self
                    .entries
                    .invalidate_entries_if(move |(ns, _), _| *ns == namespace)
                {
                    tracing::warn!(error = %e, "namespace invalidation failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn entries_expire_and_keys_clear() {
        let cache = MemoryCache::new();
        cache.set("k1", "orders", json!({"a": 1}), 60).await;
        cache.set("k2", "orders", json!({"a": 2}), 0).await;
        assert_eq!(cache.get("k1", "orders").await, Some(json!({"a": 1})));
        assert_eq!(cache.get("k2", "orders").await, None);
        assert_eq!(cache.get("k1", "users").await, None);

        cache.delete("k1", "orders", CacheDeleteMode::Key).await;
        assert_eq!(cache.get("k1", "orders").await, None);
    }

    #[tokio::test]
    async fn namespace_delete_leaves_other_namespaces() {
        let cache = MemoryCache::new();
        cache.set("k1", "orders", json!(1), 60).await;
        cache.set("k2", "orders", json!(2), 60).await;
        cache.set("k1", "users", json!(3), 60).await;

        cache.delete("", "orders", CacheDeleteMode::Namespace).await;
        assert_eq!(cache.get("k1", "orders").await, None);
        assert_eq!(cache.get("k2", "orders").await, None);
        assert_eq!(cache.get("k1", "users").await, Some(json!(3)));

        cache.set("k1", "orders", json!(4), 60).await;
        assert_eq!(cache.get("k1", "orders").await, Some(json!(4)));
    }
}
