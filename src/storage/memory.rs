//! In-Memory Storage Module
//!
//! HashMap-backed medium with an optional byte quota and a disabled mode.

use std::collections::HashMap;

use crate::error::StorageError;
use crate::storage::Storage;

// == Memory Storage ==
/// Process-local storage medium.
///
/// The quota counts key and value bytes together, the way browser storage
/// accounts for them.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    /// Raw key-value pairs
    items: HashMap<String, String>,
    /// Byte budget, None = unlimited
    quota_bytes: Option<usize>,
    /// When true every call fails with `Unavailable`
    disabled: bool,
}

impl MemoryStorage {
    // == Constructor ==
    /// Creates an empty, unlimited medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty medium that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    // == Disabled Mode ==
    /// Switches the medium on or off.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    // == Used Bytes ==
    /// Returns the number of key and value bytes currently held.
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable(
                "memory storage is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;

        if let Some(quota) = self.quota_bytes {
            let replaced = self.items.get(key).map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded(format!(
                    "writing '{}' needs {} bytes, quota is {}",
                    key, needed, quota
                )));
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.items.keys().cloned().collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut storage = MemoryStorage::new();

        storage.set_item("a", "1").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), Some("1".to_string()));

        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let mut storage = MemoryStorage::new();
        assert!(storage.remove_item("missing").is_ok());
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let mut storage = MemoryStorage::with_quota(10);

        storage.set_item("k", "12345").unwrap();
        let result = storage.set_item("big", "0123456789");

        assert!(matches!(result, Err(StorageError::QuotaExceeded(_))));
        assert_eq!(storage.get_item("big").unwrap(), None);
    }

    #[test]
    fn test_quota_accounts_for_replaced_value() {
        let mut storage = MemoryStorage::with_quota(10);

        storage.set_item("k", "123456789").unwrap();
        // Replacing in place fits even though the sum of both would not
        assert!(storage.set_item("k", "987654321").is_ok());
        assert_eq!(storage.used_bytes(), 10);
    }

    #[test]
    fn test_disabled_medium_fails_every_call() {
        let mut storage = MemoryStorage::new();
        storage.set_item("a", "1").unwrap();
        storage.set_disabled(true);

        assert!(matches!(storage.get_item("a"), Err(StorageError::Unavailable(_))));
        assert!(storage.set_item("b", "2").is_err());
        assert!(storage.remove_item("a").is_err());
        assert!(storage.keys().is_err());

        storage.set_disabled(false);
        assert_eq!(storage.get_item("a").unwrap(), Some("1".to_string()));
    }
}
