//! Remote DNC list with a local cache.
//!
//! The list is fetched once and cached in the key-value store together with
//! its match count. Later loads use the cache; a refresh refetches.

use std::time::Duration;

use reqwest::Client;

use super::{DncSet, extract_entries};
use crate::error::{DialerError, Result};
use crate::storage::{DNC_COUNT_KEY, DNC_KEY, KvStore};

/// Where a loaded DNC set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DncOrigin {
    Cache,
    Remote,
    /// Fetch failed; dialing proceeds with an empty set
    Unavailable(String),
}

/// Result of loading the DNC list
#[derive(Debug, Clone)]
pub struct DncLoad {
    pub set: DncSet,
    pub origin: DncOrigin,
}

/// HTTP client for the DNC text resource
pub struct DncSource {
    client: Client,
    url: String,
}

impl DncSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DialerError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the list and extract its raw entries, without touching the cache.
    pub async fn fetch(&self) -> Result<Vec<String>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DialerError::Network(format!("DNC fetch returned {}", status)));
        }
        let text = response.text().await?;
        Ok(extract_entries(&text))
    }

    /// Use the cached list when present, otherwise fetch and cache it.
    ///
    /// A failed fetch yields an empty set rather than an error.
    pub async fn load(&self, store: &KvStore) -> Result<DncLoad> {
        if let Some(set) = cached(store)? {
            log::info!("DNC loaded from cache: {} numbers", set.len());
            return Ok(DncLoad {
                set,
                origin: DncOrigin::Cache,
            });
        }

        match self.refresh(store).await {
            Ok(set) => Ok(DncLoad {
                set,
                origin: DncOrigin::Remote,
            }),
            Err(DialerError::Network(msg)) => {
                log::warn!("Failed to load DNC from {}: {}", self.url, msg);
                Ok(DncLoad {
                    set: DncSet::new(),
                    origin: DncOrigin::Unavailable(msg),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Refetch the list and overwrite the cache.
    pub async fn refresh(&self, store: &KvStore) -> Result<DncSet> {
        let entries = self.fetch().await?;
        save_cache(store, &entries)?;
        let set: DncSet = entries.into_iter().collect();
        log::info!("DNC fetched from {}: {} numbers", self.url, set.len());
        Ok(set)
    }
}

/// Cached DNC list, if one has been stored
pub fn cached(store: &KvStore) -> Result<Option<DncSet>> {
    let entries: Option<Vec<String>> = store.get(DNC_KEY)?;
    Ok(entries.map(|e| e.into_iter().collect()))
}

/// Match count recorded alongside the cache, repeats included
pub fn cached_count(store: &KvStore) -> Result<Option<usize>> {
    store.get(DNC_COUNT_KEY)
}

/// Store the raw matches as fetched, with their count
pub fn save_cache(store: &KvStore, entries: &[String]) -> Result<()> {
    store.set(DNC_KEY, &entries)?;
    store.set(DNC_COUNT_KEY, &entries.len())
}

/// Drop the cache so the next load refetches.
pub fn clear_cache(store: &KvStore) -> Result<()> {
    store.remove(DNC_KEY)?;
    store.remove(DNC_COUNT_KEY)?;
    Ok(())
}
