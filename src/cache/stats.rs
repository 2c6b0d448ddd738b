//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, purges and
//! absorbed storage failures.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of reads served from the cache
    pub hits: u64,
    /// Number of reads that fell through (absent, expired, malformed or unreadable)
    pub misses: u64,
    /// Entries removed because their TTL had elapsed
    pub expired: u64,
    /// Entries removed because they could not be decoded
    pub malformed: u64,
    /// Storage operations that failed and were absorbed
    pub storage_failures: u64,
    /// Entries removed to respect the entry cap
    pub evictions: u64,
    /// Keys cleared by the invalidation coordinator
    pub invalidations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expired(&mut self) {
        self.expired += 1;
    }

    pub fn record_malformed(&mut self) {
        self.malformed += 1;
    }

    pub fn record_storage_failure(&mut self) {
        self.storage_failures += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }
}
