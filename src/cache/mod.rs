//! Cache Module
//!
//! Provides a persistent key-value cache with TTL expiration and the
//! invalidation coordinator that keeps it consistent with the remote store.

mod clock;
mod entry;
pub mod invalidation;
mod keys;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use invalidation::{
    invalidate_author_posts, invalidate_for, invalidate_post_detail, invalidate_posts,
    invalidate_user_posts, Mutation,
};
pub use keys::CacheKey;
pub use stats::CacheStats;
pub use store::PersistentCache;
