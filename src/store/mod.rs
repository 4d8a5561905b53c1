//! Persistence collaborator
//!
//! An opaque async key-value store holding the three stopwatch keys, plus
//! the loader that parses them back into a record. Store failures and
//! malformed values are deliberately indistinguishable from absent data.

pub mod file;
pub mod memory;

// Re-export main types
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use tracing::warn;

/// The fixed keys of the persisted stopwatch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    /// Epoch-ms instant the open run began; present only while running.
    StartTime,
    /// Milliseconds accumulated before the open run.
    ElapsedTime,
    /// `"true"` / `"false"` running flag.
    IsRunning,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [
        StoreKey::StartTime,
        StoreKey::ElapsedTime,
        StoreKey::IsRunning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::StartTime => "startTime",
            StoreKey::ElapsedTime => "elapsedTime",
            StoreKey::IsRunning => "isRunning",
        }
    }
}

/// Async key-value persistence for the stopwatch record.
///
/// Implementations are best-effort. Callers treat every failure as absent
/// data, never retry, and never let a failure reach the user; the live
/// session does not depend on the store.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: StoreKey, value: String) -> anyhow::Result<()>;
    async fn remove(&self, key: StoreKey) -> anyhow::Result<()>;
}

/// Parsed view of the persisted keys.
///
/// There is no transactional guarantee across keys, so any combination can
/// show up after a crash; consumers must make sense of all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedRecord {
    pub start_time_ms: Option<u64>,
    pub elapsed_ms: Option<u64>,
    pub is_running: bool,
}

impl PersistedRecord {
    /// Read all three keys from the store.
    ///
    /// A read failure or an unparseable value is treated exactly like an
    /// absent key, so a fresh install, a wiped file, and a failing disk all
    /// load as the same default record.
    pub async fn load<S: StateStore + ?Sized>(store: &S) -> Self {
        let start_time_ms = read_millis(store, StoreKey::StartTime).await;
        let elapsed_ms = read_millis(store, StoreKey::ElapsedTime).await;
        let is_running = matches!(
            read_value(store, StoreKey::IsRunning).await.as_deref(),
            Some("true")
        );
        Self {
            start_time_ms,
            elapsed_ms,
            is_running,
        }
    }
}

async fn read_value<S: StateStore + ?Sized>(store: &S, key: StoreKey) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {}: {}", key.as_str(), e);
            None
        }
    }
}

async fn read_millis<S: StateStore + ?Sized>(store: &S, key: StoreKey) -> Option<u64> {
    let raw = read_value(store, key).await?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!("Ignoring malformed {} value: {:?}", key.as_str(), raw);
            None
        }
    }
}
