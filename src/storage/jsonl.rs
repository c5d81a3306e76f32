//! JSONL-backed call log store with in-memory caching.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::domain::CallLog;
use crate::error::{DialerError, Result};

const CALL_LOG_FILE: &str = "call_logs.jsonl";

/// Append-mostly store of call logs, one JSON object per line.
///
/// Logs are only ever created or updated; a session never deletes them.
pub struct CallLogStore {
    path: PathBuf,
    cache: RwLock<Option<Vec<CallLog>>>,
}

impl CallLogStore {
    /// Open the store inside `base_path`, creating the directory if needed.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref();
        fs::create_dir_all(base_path)?;
        Ok(Self {
            path: base_path.join(CALL_LOG_FILE),
            cache: RwLock::new(None),
        })
    }

    /// Load the file into cache if not already loaded.
    fn ensure_loaded(&self) -> Result<()> {
        {
            let cache = self.cache.read().map_err(|e| DialerError::Storage(e.to_string()))?;
            if cache.is_some() {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().map_err(|e| DialerError::Storage(e.to_string()))?;
        if cache.is_some() {
            return Ok(());
        }

        let mut logs = Vec::new();
        if self.path.exists() {
            let reader = BufReader::new(File::open(&self.path)?);
            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    logs.push(serde_json::from_str(&line)?);
                }
            }
        }

        *cache = Some(logs);
        Ok(())
    }

    /// Rewrite the entire file from cache.
    fn rewrite_file(&self, logs: &[CallLog]) -> Result<()> {
        let mut file = File::create(&self.path)?;
        for log in logs {
            writeln!(file, "{}", serde_json::to_string(log)?)?;
        }
        Ok(())
    }

    /// Persist a new log.
    pub fn create(&self, log: &CallLog) -> Result<()> {
        self.ensure_loaded()?;

        // Append to file first (source of truth)
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(log)?)?;

        let mut cache = self.cache.write().map_err(|e| DialerError::Storage(e.to_string()))?;
        if let Some(logs) = cache.as_mut() {
            logs.push(log.clone());
        }
        Ok(())
    }

    /// Fetch a log by id.
    pub fn get(&self, id: &str) -> Result<Option<CallLog>> {
        self.ensure_loaded()?;
        let cache = self.cache.read().map_err(|e| DialerError::Storage(e.to_string()))?;
        Ok(cache
            .as_ref()
            .and_then(|logs| logs.iter().find(|l| l.id == id).cloned()))
    }

    /// Replace a stored log with the same id.
    pub fn update(&self, log: &CallLog) -> Result<()> {
        self.ensure_loaded()?;
        let mut cache = self.cache.write().map_err(|e| DialerError::Storage(e.to_string()))?;
        let logs = cache
            .as_mut()
            .ok_or_else(|| DialerError::Storage("call logs not loaded".to_string()))?;

        let slot = logs
            .iter_mut()
            .find(|l| l.id == log.id)
            .ok_or_else(|| DialerError::CallLogNotFound(log.id.clone()))?;
        *slot = log.clone();

        self.rewrite_file(logs)
    }

    /// All logs in creation order.
    pub fn list(&self) -> Result<Vec<CallLog>> {
        self.ensure_loaded()?;
        let cache = self.cache.read().map_err(|e| DialerError::Storage(e.to_string()))?;
        Ok(cache.clone().unwrap_or_default())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
