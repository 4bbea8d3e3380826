//! Key/value storage behind the cache tiers
//!
//! `CacheStore` is object safe so that a shared external cache can replace
//! the in-memory store without touching the orchestrator. Values cross the
//! seam as `serde_json::Value`; typing happens in `CacheLayers`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::entry::CacheEntry;

/// Result of reading one key
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Live entry
    Hit(Value),
    /// Entry existed but had expired and was removed
    Expired,
    /// No entry
    Miss,
}

impl CacheLookup {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Expired | Self::Miss => None,
        }
    }
}

/// TTL key/value storage
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a key, removing it if it has expired
    async fn get(&self, key: &str) -> CacheLookup;

    /// Store a value for `ttl`
    async fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Remove a key, returning whether it existed
    async fn remove(&self, key: &str) -> bool;

    /// Drop every expired entry, returning how many were removed
    async fn purge_expired(&self) -> usize;

    /// Number of stored entries, expired or not
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry<Value>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> CacheLookup {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return CacheLookup::Miss,
                Some(entry) if !entry.is_expired_at(now) => {
                    return CacheLookup::Hit(entry.value.clone())
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a writer may have refreshed the key
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                entries.remove(key);
                debug!("Removed expired cache entry {}", key);
                CacheLookup::Expired
            }
            Some(entry) => CacheLookup::Hit(entry.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl, Utc::now());
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryCacheStore::new();
        assert_eq!(store.get("k").await, CacheLookup::Miss);

        store.set("k", json!([1, 2]), Duration::from_secs(60)).await;
        assert_eq!(store.get("k").await, CacheLookup::Hit(json!([1, 2])));
        assert_eq!(store.len().await, 1);

        assert!(store.remove("k").await);
        assert!(!store.remove("k").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_read() {
        let store = MemoryCacheStore::new();
        store.set("k", json!("v"), Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get("k").await, CacheLookup::Expired);
        assert_eq!(store.len().await, 0);
        assert_eq!(store.get("k").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryCacheStore::new();
        store.set("short", json!(1), Duration::from_millis(10)).await;
        store.set("long", json!(2), Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("long").await.into_value().is_some());
    }
}
