pub mod file;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Abstraction over the small key/value state the tool persists.
/// Implementations: FileStore (JSON on disk), MemoryStore, DisabledStore.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Unreadable storage reads as absent.
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Storage that is switched off: every read is empty, every write is dropped.
pub struct DisabledStore;

#[async_trait]
impl KeyValueStore for DisabledStore {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, key: &str, _value: &str) -> anyhow::Result<()> {
        tracing::debug!(key, "state persistence disabled, dropping write");
        Ok(())
    }
}

/// Pick the store for a configured state path. `None` disables persistence.
pub fn from_path(path: Option<std::path::PathBuf>) -> Arc<dyn KeyValueStore> {
    match path {
        Some(p) => Arc::new(FileStore::new(p)),
        None => Arc::new(DisabledStore),
    }
}
