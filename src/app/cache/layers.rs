//! Parsed-result and raw-snapshot cache tiers
//!
//! Both tiers share one store. A parsed entry lives under the caller's key
//! for the caller's TTL; the raw snapshot lives under the same key plus a
//! fixed suffix for the fixed, shorter raw TTL. Values that fail to
//! deserialize are treated as corrupt: logged, removed and reported as a miss.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::key_lock::KeyLocks;
use super::stats::{CacheStats, CacheStatsSnapshot, CacheTier};
use super::store::{CacheLookup, CacheStore, MemoryCacheStore};
use crate::app::client::RawSnapshot;
use crate::errors::{CacheError, CacheResult};

/// Typed access to both cache tiers with per-key serialization
pub struct CacheLayers {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    locks: KeyLocks,
    stats: CacheStats,
}

impl std::fmt::Debug for CacheLayers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayers")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl CacheLayers {
    /// Create cache layers over an existing store
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            locks: KeyLocks::new(),
            stats: CacheStats::new(),
        }
    }

    /// Create cache layers over a fresh in-memory store
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), config)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Reject blank keys
    pub fn validate_key(key: &str) -> CacheResult<()> {
        if key.trim().is_empty() {
            return Err(CacheError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Reject zero TTLs
    pub fn validate_ttl(key: &str, ttl: Duration) -> CacheResult<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Key of the raw snapshot belonging to a parsed key
    pub fn raw_key(&self, key: &str) -> String {
        format!("{}{}", key, self.config.raw_key_suffix)
    }

    /// Serialize all work on `key` (and its raw companion) behind one lock
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        self.locks.lock_key(key).await
    }

    /// Read a typed value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read(key, CacheTier::Parsed).await
    }

    /// Store a typed value for `ttl`
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidKey`, `CacheError::InvalidTtl` or
    /// `CacheError::Serialization`.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        Self::validate_key(key)?;
        Self::validate_ttl(key, ttl)?;
        let value = serde_json::to_value(value)?;
        self.store.set(key, value, ttl).await;
        self.stats.record_write();
        debug!("Cached {} for {:?}", key, ttl);
        Ok(())
    }

    /// Read parsed records for a key
    pub async fn get_parsed<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        self.read(key, CacheTier::Parsed).await
    }

    /// Store parsed records for a key
    pub async fn set_parsed<T: Serialize>(
        &self,
        key: &str,
        records: &[T],
        ttl: Duration,
    ) -> CacheResult<()> {
        self.set(key, records, ttl).await
    }

    /// Read the raw snapshot belonging to a parsed key
    pub async fn get_raw(&self, key: &str) -> Option<RawSnapshot> {
        self.read(&self.raw_key(key), CacheTier::Raw).await
    }

    /// Store the raw snapshot belonging to a parsed key for the fixed raw TTL
    pub async fn set_raw(&self, key: &str, snapshot: &RawSnapshot) -> CacheResult<()> {
        self.set(&self.raw_key(key), snapshot, self.config.raw_ttl)
            .await
    }

    /// Drop the raw snapshot of a key, used when it no longer parses
    pub async fn invalidate_raw(&self, key: &str) -> bool {
        self.store.remove(&self.raw_key(key)).await
    }

    /// Remove both tiers of a key
    pub async fn remove(&self, key: &str) -> bool {
        let parsed = self.store.remove(key).await;
        let raw = self.store.remove(&self.raw_key(key)).await;
        parsed || raw
    }

    /// Sweep expired entries and idle key locks
    pub async fn purge_expired(&self) -> usize {
        let purged = self.store.purge_expired().await;
        self.stats.record_expirations(purged as u64);
        let pruned = self.locks.prune_idle().await;
        if purged > 0 || pruned > 0 {
            debug!(
                "Purged {} expired cache entries and {} idle key locks",
                purged, pruned
            );
        }
        purged
    }

    /// Number of stored entries across both tiers
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    async fn read<T: DeserializeOwned>(&self, key: &str, tier: CacheTier) -> Option<T> {
        let value = match self.store.get(key).await {
            CacheLookup::Hit(value) => value,
            CacheLookup::Expired => {
                self.stats.record_expirations(1);
                self.stats.record_miss(tier);
                debug!("Cache entry {} expired ({:?})", key, tier);
                return None;
            }
            CacheLookup::Miss => {
                self.stats.record_miss(tier);
                debug!("Cache miss for {} ({:?})", key, tier);
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(typed) => {
                self.stats.record_hit(tier);
                debug!("Cache hit for {} ({:?})", key, tier);
                Some(typed)
            }
            Err(e) => {
                warn!("Discarding corrupt cache entry {}: {}", key, e);
                self.store.remove(key).await;
                self.stats.record_corrupt();
                self.stats.record_miss(tier);
                None
            }
        }
    }
}
