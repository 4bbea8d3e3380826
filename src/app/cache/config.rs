//! Cache configuration types and defaults
//!
//! This module contains the TTLs and key convention shared by both cache
//! tiers, with default values and validation logic.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::cache;

/// Configuration for the two-tier report cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of parsed results when the caller does not supply one
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
    /// Fixed TTL of raw page snapshots
    #[serde(with = "humantime_serde")]
    pub raw_ttl: Duration,
    /// Suffix appended to a parsed key to form its raw key
    pub raw_key_suffix: String,
    /// How often expired entries and idle key locks are swept
    #[serde(with = "humantime_serde")]
    pub purge_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: cache::DEFAULT_TTL,
            raw_ttl: cache::RAW_TTL,
            raw_key_suffix: cache::RAW_KEY_SUFFIX.to_string(),
            purge_interval: cache::PURGE_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Set the default parsed-result TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the raw snapshot TTL
    pub fn with_raw_ttl(mut self, ttl: Duration) -> Self {
        self.raw_ttl = ttl;
        self
    }

    /// Set the purge interval
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_ttl.is_zero() {
            return Err("Default cache TTL cannot be zero".to_string());
        }

        if self.raw_ttl.is_zero() {
            return Err("Raw cache TTL cannot be zero".to_string());
        }

        if self.raw_key_suffix.is_empty() {
            return Err("Raw cache key suffix cannot be empty".to_string());
        }

        if self.purge_interval.is_zero() {
            return Err("Cache purge interval cannot be zero".to_string());
        }

        Ok(())
    }

    /// Whether raw snapshots outlive parsed results, which defeats their purpose
    pub fn raw_ttl_exceeds_default(&self) -> bool {
        self.raw_ttl >= self.default_ttl
    }
}
