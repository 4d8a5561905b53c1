//! In-memory store for tests and ephemeral runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{StateStore, StoreKey};

/// Keeps the record in process memory; nothing survives exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock memory store: {}", e))?;
        Ok(entries.get(key.as_str()).cloned())
    }

    async fn set(&self, key: StoreKey, value: String) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock memory store: {}", e))?;
        entries.insert(key.as_str().to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock memory store: {}", e))?;
        entries.remove(key.as_str());
        Ok(())
    }
}
