//! Local persistence: a key-value blob store and the call log store.
//!
//! Settings and the cached DNC list live under fixed keys in the key-value
//! store; call logs are appended to a JSONL file.

mod jsonl;
mod kv;

pub use jsonl::CallLogStore;
pub use kv::KvStore;

use crate::domain::AgentSettings;
use crate::error::Result;

/// Key holding the agent settings blob
pub const SETTINGS_KEY: &str = "accm_admin";

/// Key holding the cached DNC entries
pub const DNC_KEY: &str = "accm_dnc";

/// Key holding the number of cached DNC entries
pub const DNC_COUNT_KEY: &str = "accm_dnc_count";

/// Load the settings blob, falling back to defaults when nothing is stored.
pub fn load_settings(store: &KvStore) -> Result<AgentSettings> {
    Ok(store.get(SETTINGS_KEY)?.unwrap_or_default())
}

/// Persist the settings blob.
pub fn save_settings(store: &KvStore, settings: &AgentSettings) -> Result<()> {
    store.set(SETTINGS_KEY, settings)
}
