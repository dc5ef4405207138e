use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{KeyValueStore, StorageError};

/// On-disk envelope for a single key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredItem {
    pub value: String,
    pub written_at: DateTime<Utc>,
}

impl StoredItem {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            written_at: Utc::now(),
        }
    }
}

/// Directory-backed store: each key lives in `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys become file names, so only a conservative character set is allowed.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if valid {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    fn item_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Load the full envelope for `key`, including when it was written.
    pub fn load(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        let path = self.item_path(key)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let item = serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(item))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load(key)?.map(|item| item.value))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(&StoredItem::new(value))
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })?;

        // Write-then-rename keeps readers from seeing a half-written file
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &path)?;
        debug!(key = key, path = %path.display(), "Stored item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = key, "Removed item");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
