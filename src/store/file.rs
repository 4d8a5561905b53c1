//! JSON-file-backed store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

use super::{StateStore, StoreKey};

/// Single-file JSON object store (string keys, string values).
///
/// Reads tolerate a missing or corrupt file by treating it as empty; every
/// write rewrites the whole document. That is plenty for a handful of
/// stopwatch keys and keeps the on-disk format inspectable by hand.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> BTreeMap<String, String> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read state file {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    "State file {} is not valid JSON, starting empty: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    async fn write_document(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(map)?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.read_document().await.get(key.as_str()).cloned())
    }

    async fn set(&self, key: StoreKey, value: String) -> Result<()> {
        let mut map = self.read_document().await;
        map.insert(key.as_str().to_string(), value);
        self.write_document(&map).await
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        let mut map = self.read_document().await;
        if map.remove(key.as_str()).is_some() {
            self.write_document(&map).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PersistedRecord;

    #[tokio::test]
    async fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        assert_eq!(store.get(StoreKey::StartTime).await.unwrap(), None);
        let record = PersistedRecord::load(&store).await;
        assert_eq!(record, PersistedRecord::default());
    }

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));

        store
            .set(StoreKey::StartTime, "123456".to_string())
            .await
            .unwrap();
        store
            .set(StoreKey::IsRunning, "true".to_string())
            .await
            .unwrap();

        assert_eq!(
            store.get(StoreKey::StartTime).await.unwrap(),
            Some("123456".to_string())
        );
        assert_eq!(
            store.get(StoreKey::IsRunning).await.unwrap(),
            Some("true".to_string())
        );

        store.remove(StoreKey::StartTime).await.unwrap();
        assert_eq!(store.get(StoreKey::StartTime).await.unwrap(), None);
        // Other keys are untouched by a remove.
        assert_eq!(
            store.get(StoreKey::IsRunning).await.unwrap(),
            Some("true".to_string())
        );
    }

    #[tokio::test]
    async fn values_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::new(&path);
        store
            .set(StoreKey::ElapsedTime, "2500".to_string())
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get(StoreKey::ElapsedTime).await.unwrap(),
            Some("2500".to_string())
        );
    }

    #[tokio::test]
    async fn corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get(StoreKey::ElapsedTime).await.unwrap(), None);

        // Writing through a corrupt file replaces it with a clean document.
        store
            .set(StoreKey::ElapsedTime, "10".to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get(StoreKey::ElapsedTime).await.unwrap(),
            Some("10".to_string())
        );
    }
}
