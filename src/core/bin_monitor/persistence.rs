//! Loading and flushing the store through a [`BlobStore`].
//!
//! The `db` key holds state, settings and history together; `settings`,
//! `logs` and `history` are also written on their own and win over the `db`
//! copy when present, so `config set` only has to touch one key.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::history::HistoryAggregator;
use super::logbook::LogBook;
use super::state::DeviceState;
use super::store::StateStore;
use crate::core::config::Settings;
use crate::core::storage::{BlobStore, KEY_DB, KEY_HISTORY, KEY_LOGS, KEY_SETTINGS};
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedDb {
    pub state: DeviceState,
    pub settings: Settings,
    pub history: HistoryAggregator,
}

/// Rebuild the store. Missing or corrupted entries fall back to defaults;
/// this never fails.
pub fn load_store(store: &dyn BlobStore) -> StateStore {
    let db: PersistedDb = read_key(store, KEY_DB).unwrap_or_default();
    let settings: Settings = read_key(store, KEY_SETTINGS).unwrap_or(db.settings);
    let history: HistoryAggregator = read_key(store, KEY_HISTORY).unwrap_or(db.history);
    let logs: LogBook = read_key(store, KEY_LOGS).unwrap_or_default();

    StateStore::from_parts(db.state, settings.sanitized(), logs, history)
}

/// Write every key. Failures are logged and reported as `false`; the
/// in-memory store stays authoritative either way.
pub fn save_store(store: &dyn BlobStore, state: &StateStore) -> bool {
    match try_save(store, state) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to persist monitor state: {}", e);
            false
        }
    }
}

fn try_save(store: &dyn BlobStore, state: &StateStore) -> Result<()> {
    let db = PersistedDb {
        state: state.snapshot(),
        settings: state.settings().clone(),
        history: state.history().clone(),
    };

    store.put(KEY_DB, &serde_json::to_string(&db)?)?;
    store.put(KEY_SETTINGS, &serde_json::to_string_pretty(state.settings())?)?;
    store.put(KEY_LOGS, &serde_json::to_string(state.logs())?)?;
    store.put(KEY_HISTORY, &serde_json::to_string(state.history())?)?;
    Ok(())
}

fn read_key<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return None,
        Err(e) => {
            log::warn!("Failed to read '{}' from storage: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Stored '{}' is corrupted, using defaults: {}", key, e);
            None
        }
    }
}
