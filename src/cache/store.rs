//! Cache Store Module
//!
//! Main cache engine: TTL entries persisted in a durable storage medium, with
//! lazy expiry and failure absorption.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStats, Clock, SystemClock};
use crate::config::{Config, DEFAULT_PREFIX, DEFAULT_TTL_MS};
use crate::error::StorageError;
use crate::storage::Storage;

/// Outcome of reading one physical entry.
enum Loaded {
    Missing,
    Unreadable(StorageError),
    Malformed(serde_json::Error),
    Entry(CacheEntry),
}

// == Persistent Cache ==
/// Key-value cache with TTL expiry on top of a [`Storage`] medium.
///
/// No operation ever returns an error: storage failures are logged, counted
/// and turned into misses or no-ops.
#[derive(Debug)]
pub struct PersistentCache<S, C = SystemClock> {
    /// Durable medium holding the serialized entries
    storage: S,
    /// Time source for write stamps and expiry checks
    clock: C,
    /// Prefix namespacing physical keys
    prefix: String,
    /// TTL used when `set` is given none
    default_ttl: Duration,
    /// Maximum entries under the prefix, None = unbounded
    max_entries: Option<usize>,
    /// Performance statistics
    stats: CacheStats,
}

impl<S: Storage> PersistentCache<S, SystemClock> {
    // == Constructor ==
    /// Creates a cache over `storage` using wall-clock time and defaults.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> PersistentCache<S, C> {
    /// Creates a cache over `storage` driven by `clock`.
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            max_entries: None,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache using the prefix, default TTL and entry cap from `config`.
    pub fn from_config(storage: S, clock: C, config: &Config) -> Self {
        Self::with_clock(storage, clock)
            .with_prefix(config.prefix.clone())
            .with_default_ttl(config.default_ttl())
            .with_max_entries(config.entry_limit())
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    // == Set ==
    /// Stores `value` under `key` with an optional TTL.
    ///
    /// Overwrites any existing entry and restarts its lifetime. Failures to
    /// encode or write are logged and the call becomes a no-op.
    ///
    /// # Arguments
    /// * `key` - Logical key, e.g. `all_posts`
    /// * `value` - Any serializable payload
    /// * `ttl` - Optional lifetime (uses the default TTL if None)
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, ttl: Option<Duration>) {
        let ttl_ms = duration_ms(ttl.unwrap_or(self.default_ttl));
        let physical = self.physical_key(key);

        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cache set failed for '{}': {}", key, e);
                self.stats.record_storage_failure();
                return;
            }
        };

        let entry = CacheEntry::new(payload, self.clock.now_ms(), Some(ttl_ms));
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache set failed for '{}': {}", key, e);
                self.stats.record_storage_failure();
                return;
            }
        };

        let is_new = self.max_entries.is_some() && matches!(self.load(&physical), Loaded::Missing);

        match self.storage.set_item(&physical, &raw) {
            Ok(()) => debug!("Cached '{}' for {}ms", key, ttl_ms),
            Err(e) => {
                warn!("Cache set failed for '{}': {}", key, e);
                self.stats.record_storage_failure();
                return;
            }
        }

        if is_new {
            self.enforce_limit(&physical);
        }
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns None when the entry is absent, expired, malformed, of another
    /// shape than `T`, or when storage cannot be read. Expired and malformed
    /// entries are removed as a side effect.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let physical = self.physical_key(key);

        let entry = match self.load(&physical) {
            Loaded::Entry(entry) => entry,
            Loaded::Missing => {
                self.stats.record_miss();
                return None;
            }
            Loaded::Unreadable(e) => {
                warn!("Cache get failed for '{}': {}", key, e);
                self.stats.record_storage_failure();
                self.stats.record_miss();
                return None;
            }
            Loaded::Malformed(e) => {
                warn!("Discarding malformed cache entry '{}': {}", key, e);
                self.discard(&physical);
                self.stats.record_malformed();
                self.stats.record_miss();
                return None;
            }
        };

        if entry.is_expired(self.clock.now_ms()) {
            debug!("Cache entry '{}' expired", key);
            self.discard(&physical);
            self.stats.record_expired();
            self.stats.record_miss();
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!("Cache hit for '{}'", key);
                self.stats.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!("Discarding cache entry '{}' of unexpected shape: {}", key, e);
                self.discard(&physical);
                self.stats.record_malformed();
                self.stats.record_miss();
                None
            }
        }
    }

    // == Clear ==
    /// Removes the entry for `key`, whatever its state. Idempotent.
    pub fn clear(&mut self, key: &str) {
        let physical = self.physical_key(key);
        if let Err(e) = self.storage.remove_item(&physical) {
            warn!("Cache clear failed for '{}': {}", key, e);
            self.stats.record_storage_failure();
        }
    }

    // == Invalidate ==
    /// Clears the canonical key of `key` and records the invalidation.
    pub fn invalidate(&mut self, key: &CacheKey) {
        let key = key.as_key();
        debug!("Invalidating cache key '{}'", key);
        self.clear(&key);
        self.stats.record_invalidation();
    }

    // == Peek ==
    /// Returns the raw entry for `key` without touching stats or removing it.
    ///
    /// Expired entries are returned as-is; malformed or unreadable ones are None.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        match self.load(&self.physical_key(key)) {
            Loaded::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    // == Purge Expired ==
    /// Removes every expired or malformed entry under the prefix.
    ///
    /// Never scheduled; callers invoke it explicitly. Returns the number of
    /// entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;

        for physical in self.owned_keys() {
            match self.load(&physical) {
                Loaded::Entry(entry) if entry.is_expired(now) => {
                    self.stats.record_expired();
                }
                Loaded::Malformed(_) => {
                    self.stats.record_malformed();
                }
                _ => continue,
            }
            self.discard(&physical);
            removed += 1;
        }

        if removed > 0 {
            debug!("Purged {} stale cache entries", removed);
        }
        removed
    }

    // == Keys ==
    /// Returns the logical keys currently stored under the prefix, sorted.
    pub fn keys(&self) -> Vec<String> {
        let namespace = self.namespace();
        let mut keys: Vec<String> = self
            .owned_keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(&namespace).map(str::to_string))
            .collect();
        keys.sort();
        keys
    }

    // == Length ==
    /// Returns the number of stored entries under the prefix, stale ones included.
    pub fn len(&self) -> usize {
        self.owned_keys().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Physical storage key for logical `key`.
    pub fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace(), key)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn namespace(&self) -> String {
        format!("{}_", self.prefix)
    }

    /// Physical keys belonging to this cache. Unreadable storage yields none.
    fn owned_keys(&self) -> Vec<String> {
        let namespace = self.namespace();
        match self.storage.keys() {
            Ok(keys) => keys.into_iter().filter(|k| k.starts_with(&namespace)).collect(),
            Err(e) => {
                warn!("Cache key listing failed: {}", e);
                Vec::new()
            }
        }
    }

    fn load(&self, physical: &str) -> Loaded {
        match self.storage.get_item(physical) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entry) => Loaded::Entry(entry),
                Err(e) => Loaded::Malformed(e),
            },
            Ok(None) => Loaded::Missing,
            Err(e) => Loaded::Unreadable(e),
        }
    }

    fn discard(&mut self, physical: &str) {
        if let Err(e) = self.storage.remove_item(physical) {
            warn!("Cache removal of '{}' failed: {}", physical, e);
            self.stats.record_storage_failure();
        }
    }

    // == Enforce Limit ==
    /// Trims the entries under the prefix back to the cap after `written`
    /// was added.
    ///
    /// Runs only once the write has landed, so a rejected write evicts
    /// nothing. Stale entries go first, then live entries with the oldest
    /// write stamp. `written` itself is never a candidate.
    fn enforce_limit(&mut self, written: &str) {
        let Some(limit) = self.max_entries else {
            return;
        };

        let owned = self.owned_keys();
        if owned.len() <= limit {
            return;
        }

        let now = self.clock.now_ms();
        let mut live: Vec<(u64, String)> = Vec::with_capacity(owned.len());
        for key in owned.into_iter().filter(|k| k != written) {
            match self.load(&key) {
                Loaded::Entry(entry) if !entry.is_expired(now) => live.push((entry.ts, key)),
                Loaded::Entry(_) => {
                    self.discard(&key);
                    self.stats.record_expired();
                }
                Loaded::Malformed(_) => {
                    self.discard(&key);
                    self.stats.record_malformed();
                }
                Loaded::Missing | Loaded::Unreadable(_) => {}
            }
        }

        live.sort();
        let excess = (live.len() + 1).saturating_sub(limit);
        for (_, key) in live.into_iter().take(excess) {
            debug!("Evicting cache entry '{}'", key);
            self.discard(&key);
            self.stats.record_eviction();
        }
    }
}

fn duration_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
