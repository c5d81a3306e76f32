//! File-backed key-value store for settings and the cached DNC list.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{DialerError, Result};

const STATE_FILE: &str = "state.json";

/// JSON object on disk, keyed by fixed storage keys, mirrored in memory.
pub struct KvStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl KvStore {
    /// Open the store inside `base_path`, loading any existing state.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref();
        fs::create_dir_all(base_path)?;
        let path = base_path.join(STATE_FILE);

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(entries),
        })
    }

    /// Read and decode the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let cache = self.cache.read().map_err(|e| DialerError::Storage(e.to_string()))?;
        match cache.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Store `value` under `key` and flush to disk.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut cache = self.cache.write().map_err(|e| DialerError::Storage(e.to_string()))?;
        cache.insert(key.to_string(), value);
        self.flush(&cache)
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut cache = self.cache.write().map_err(|e| DialerError::Storage(e.to_string()))?;
        let existed = cache.remove(key).is_some();
        if existed {
            self.flush(&cache)?;
        }
        Ok(existed)
    }

    fn flush(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        // Write beside the target then rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
