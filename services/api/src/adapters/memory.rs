//! services/api/src/adapters/memory.rs
//!
//! In-memory `KeyValueStore`, used by tests and when no data directory is wanted.

use async_trait::async_trait;
use score_ledger_core::ports::{KeyValueStore, PortResult, StorageKey};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the given records.
    pub fn with_records(records: impl IntoIterator<Item = (StorageKey, String)>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: StorageKey) -> PortResult<Option<String>> {
        Ok(self.records.lock().await.get(&key).cloned())
    }

    async fn save(&self, key: StorageKey, blob: &str) -> PortResult<()> {
        self.records.lock().await.insert(key, blob.to_string());
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> PortResult<()> {
        self.records.lock().await.remove(&key);
        Ok(())
    }
}
