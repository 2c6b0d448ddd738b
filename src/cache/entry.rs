//! Cache Entry Module
//!
//! Defines the persisted record for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single persisted cache entry with value and metadata.
///
/// Serialized as `{"ts": <millis>, "ttl": <millis>, "value": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Write timestamp (Unix milliseconds)
    pub ts: u64,
    /// Lifetime in milliseconds, None = never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// The stored payload
    pub value: Value,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry written at `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `now_ms` - Write time in Unix milliseconds
    /// * `ttl_ms` - Optional lifetime in milliseconds
    pub fn new(value: Value, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            ts: now_ms,
            ttl: ttl_ms,
            value,
        }
    }

    // == Is Expired ==
    /// Checks if the entry is stale at `now_ms`.
    ///
    /// Boundary condition: an entry stays valid while `now - ts <= ttl`, so it
    /// is still served at exactly `ts + ttl` and expires one millisecond later.
    /// A timestamp in the future (clock skew) counts as zero age.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.ttl {
            Some(ttl) => now_ms.saturating_sub(self.ts) > ttl,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.ttl.map(|ttl| {
            let expires = self.ts.saturating_add(ttl);
            expires.saturating_sub(now_ms)
        })
    }
}
