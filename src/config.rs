//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default physical key prefix for cache entries.
pub const DEFAULT_PREFIX: &str = "tdm_cache";

/// Default TTL applied when a caller gives none (10 minutes).
pub const DEFAULT_TTL_MS: u64 = 1000 * 60 * 10;

/// TTL used by the global post listing (30 minutes).
pub const ALL_POSTS_TTL_MS: u64 = 1000 * 60 * 30;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix prepended to every logical key in durable storage
    pub prefix: String,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// TTL in milliseconds for the `all_posts` listing
    pub all_posts_ttl_ms: u64,
    /// Maximum number of cache entries, 0 = unbounded
    pub max_entries: usize,
    /// Location of the file-backed storage
    pub storage_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX` - Physical key prefix (default: tdm_cache)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 600000)
    /// - `ALL_POSTS_TTL_MS` - Post listing TTL in milliseconds (default: 1800000)
    /// - `CACHE_MAX_ENTRIES` - Entry cap, 0 disables it (default: 0)
    /// - `CACHE_PATH` - Storage file path (default: post_cache.json)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            prefix: env::var("CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.prefix),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            all_posts_ttl_ms: env::var("ALL_POSTS_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.all_posts_ttl_ms),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            storage_path: env::var("CACHE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
        }
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Listing TTL as a Duration.
    pub fn all_posts_ttl(&self) -> Duration {
        Duration::from_millis(self.all_posts_ttl_ms)
    }

    /// Entry cap, `None` when unbounded.
    pub fn entry_limit(&self) -> Option<usize> {
        (self.max_entries > 0).then_some(self.max_entries)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl_ms: DEFAULT_TTL_MS,
            all_posts_ttl_ms: ALL_POSTS_TTL_MS,
            max_entries: 0,
            storage_path: PathBuf::from("post_cache.json"),
        }
    }
}
