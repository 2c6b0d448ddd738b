//! File Storage Module
//!
//! Durable medium persisted as a single JSON object on disk. One file plays
//! the role of one origin: every handle opening the same path shares it.
//! Nothing is kept in memory between calls, so a handle always sees what
//! other handles wrote and only ever changes the keys it touches.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::Storage;

type Items = BTreeMap<String, String>;

// == File Storage ==
/// Write-through JSON file storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Location of the backing file
    path: PathBuf,
}

impl FileStorage {
    // == Open ==
    /// Opens the storage file at `path`.
    ///
    /// A missing file reads as empty. A file that cannot be parsed is logged
    /// and also reads as empty; it is overwritten on the next write. Other
    /// I/O errors are returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let storage = Self {
            path: path.as_ref().to_path_buf(),
        };
        let items = storage.load()?;
        debug!("Opened storage file {} with {} items", storage.path.display(), items.len());
        Ok(storage)
    }

    // == Path ==
    /// Returns the backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Load ==
    /// Reads the current contents of the file.
    fn load(&self) -> Result<Items, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!("Storage file {} is corrupt, reading as empty: {}", self.path.display(), e);
                    Ok(Items::new())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Items::new()),
            Err(e) => Err(e.into()),
        }
    }

    // == Persist ==
    /// Writes the whole map to a temp file and renames it into place.
    ///
    /// The temp name carries the process id so concurrent writers never
    /// share one.
    fn persist(&self, items: &Items) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", std::process::id()));
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, raw)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let mut items = self.load()?;
        if items.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&items)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.load()?.into_keys().collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("cache.json")).unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        {
            let mut storage = FileStorage::open(&path).unwrap();
            storage.set_item("tdm_cache_all_posts", "[1,2]").unwrap();
            storage.set_item("other", "x").unwrap();
            storage.remove_item("other").unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get_item("tdm_cache_all_posts").unwrap(),
            Some("[1,2]".to_string())
        );
        assert_eq!(reopened.get_item("other").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_opens_empty_and_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let mut storage = FileStorage::open(&path).unwrap();
        assert!(storage.keys().unwrap().is_empty());

        storage.set_item("k", "v").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("origin").join("cache.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("k", "v").unwrap();

        assert!(path.exists());
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn test_failed_write_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("k", "old").unwrap();

        // A directory squatting on the temp name makes the write fail
        let tmp = dir.path().join(format!("cache.json.{}.tmp", std::process::id()));
        fs::create_dir(&tmp).unwrap();

        assert!(storage.set_item("k", "new").is_err());
        assert_eq!(storage.get_item("k").unwrap(), Some("old".to_string()));
    }

    #[test]
    fn test_handles_see_each_other() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let mut first = FileStorage::open(&path).unwrap();
        let mut second = FileStorage::open(&path).unwrap();

        first.set_item("a", "1").unwrap();
        assert_eq!(second.get_item("a").unwrap(), Some("1".to_string()));

        second.remove_item("a").unwrap();
        second.set_item("b", "2").unwrap();
        first.set_item("c", "3").unwrap();

        assert_eq!(first.get_item("a").unwrap(), None);
        let mut keys = second.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
