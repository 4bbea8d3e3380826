//! Cache hit/miss counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Which cache tier an event concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Parsed,
    Raw,
}

/// Live counters shared by all callers
#[derive(Debug, Default)]
pub struct CacheStats {
    parsed_hits: AtomicU64,
    parsed_misses: AtomicU64,
    raw_hits: AtomicU64,
    raw_misses: AtomicU64,
    writes: AtomicU64,
    expirations: AtomicU64,
    corrupt_entries: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub parsed_hits: u64,
    pub parsed_misses: u64,
    pub raw_hits: u64,
    pub raw_misses: u64,
    pub writes: u64,
    pub expirations: u64,
    pub corrupt_entries: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, tier: CacheTier) {
        match tier {
            CacheTier::Parsed => &self.parsed_hits,
            CacheTier::Raw => &self.raw_hits,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self, tier: CacheTier) {
        match tier {
            CacheTier::Parsed => &self.parsed_misses,
            CacheTier::Raw => &self.raw_misses,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_corrupt(&self) {
        self.corrupt_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            parsed_hits: self.parsed_hits.load(Ordering::Relaxed),
            parsed_misses: self.parsed_misses.load(Ordering::Relaxed),
            raw_hits: self.raw_hits.load(Ordering::Relaxed),
            raw_misses: self.raw_misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            corrupt_entries: self.corrupt_entries.load(Ordering::Relaxed),
        }
    }
}

impl CacheStatsSnapshot {
    /// Fraction of parsed-tier reads served from cache
    pub fn parsed_hit_rate(&self) -> f64 {
        let total = self.parsed_hits + self.parsed_misses;
        if total == 0 {
            return 0.0;
        }
        self.parsed_hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = CacheStats::new();
        stats.record_hit(CacheTier::Parsed);
        stats.record_miss(CacheTier::Parsed);
        stats.record_miss(CacheTier::Parsed);
        stats.record_hit(CacheTier::Raw);
        stats.record_write();
        stats.record_expirations(3);
        stats.record_corrupt();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.parsed_hits, 1);
        assert_eq!(snapshot.parsed_misses, 2);
        assert_eq!(snapshot.raw_hits, 1);
        assert_eq!(snapshot.raw_misses, 0);
        assert_eq!(snapshot.writes, 1);
        assert_eq!(snapshot.expirations, 3);
        assert_eq!(snapshot.corrupt_entries, 1);
        assert!((snapshot.parsed_hit_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_hit_rate() {
        assert_eq!(CacheStatsSnapshot::default().parsed_hit_rate(), 0.0);
    }
}
