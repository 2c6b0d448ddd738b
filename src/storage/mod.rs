//! Storage Module
//!
//! Durable, origin-scoped string key-value media that back the cache.
//!
//! # Backends
//! - `MemoryStorage` - process-local map with optional quota, for tests and ephemeral sessions
//! - `FileStorage` - JSON file written through on every mutation, survives restarts

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

// == Storage Trait ==
/// A string-to-string durable medium.
///
/// Every call may fail; the cache layer absorbs those failures.
pub trait Storage {
    /// Reads the raw value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
