//! Two-tier report cache
//!
//! Parsed records are cached under a caller-supplied key; the page they came
//! from is cached under the same key plus a suffix for a shorter, fixed TTL
//! so that a re-parse can skip the network. Entries expire passively and are
//! removed on read or by the periodic purge.
//!
//! # Module Organization
//!
//! - [`config`] - TTLs and key convention
//! - [`entry`] - entries with absolute expiry
//! - [`store`] - the `CacheStore` seam and the in-memory store
//! - [`key_lock`] - per-key serialization
//! - [`stats`] - hit/miss counters
//! - [`layers`] - typed parsed and raw tiers

pub mod config;
pub mod entry;
pub mod key_lock;
pub mod layers;
pub mod stats;
pub mod store;

pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use key_lock::KeyLocks;
pub use layers::CacheLayers;
pub use stats::{CacheStats, CacheStatsSnapshot, CacheTier};
pub use store::{CacheLookup, CacheStore, MemoryCacheStore};
