use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::KeyValueStore;

/// Process-local store. Cheap to clone; clones share entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of entries (for debugging).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_overwrites_and_clones_share() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("token", "a").await.unwrap();
        store.set("token", "b").await.unwrap();

        assert_eq!(other.get("token").await.as_deref(), Some("b"));
        assert_eq!(other.len(), 1);
        assert!(other.get("missing").await.is_none());
    }
}
