//! Per-call acquisition options

use std::time::Duration;

use crate::app::parser::ParseMetadata;

/// Whether a call may read from the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheControl {
    /// Read and write both tiers
    #[default]
    UseCache,
    /// Skip cache reads; results are still written for later callers
    Bypass,
}

impl CacheControl {
    /// Interpret an inbound `Cache-Control` header value
    ///
    /// `no-cache`, `no-store` and `max-age=0` request a bypass.
    pub fn from_header_value(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::UseCache;
        };

        let bypass = value.split(',').any(|directive| {
            let directive = directive.trim().to_lowercase();
            match directive.as_str() {
                "no-cache" | "no-store" => true,
                _ => directive
                    .strip_prefix("max-age=")
                    .and_then(|age| age.trim().parse::<u64>().ok())
                    .map(|age| age == 0)
                    .unwrap_or(false),
            }
        });

        if bypass {
            Self::Bypass
        } else {
            Self::UseCache
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass)
    }
}

/// Caching and parsing options for one `get_data` call
#[derive(Debug, Clone, Default)]
pub struct AcquireOptions {
    /// Parsed-tier key; without one nothing is read from or written to the cache
    pub cache_key: Option<String>,
    /// Parsed-tier TTL; the configured default when absent
    pub ttl: Option<Duration>,
    pub cache_control: CacheControl,
    pub metadata: Option<ParseMetadata>,
}

impl AcquireOptions {
    /// Uncached acquisition
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached under `key`
    pub fn cached(key: impl Into<String>) -> Self {
        Self {
            cache_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_cache_control(mut self, cache_control: CacheControl) -> Self {
        self.cache_control = cache_control;
        self
    }

    /// Skip cache reads for this call
    pub fn bypass_cache(self) -> Self {
        self.with_cache_control(CacheControl::Bypass)
    }

    pub fn with_metadata(mut self, metadata: ParseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
