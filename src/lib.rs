//! Post Cache - persistent TTL cache for a social blogging client
//!
//! Keeps post listings and post details in a durable key-value medium with
//! lazy expiry, and clears exactly the affected keys when posts change.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod storage;

pub use app::{Action, App, AppState, PostCard};
pub use cache::{CacheKey, CacheStats, Mutation, PersistentCache};
pub use config::Config;
pub use error::{AppError, Result};
pub use storage::{FileStorage, MemoryStorage, Storage};
