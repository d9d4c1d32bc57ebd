//! JSON-file key/value store.
//!
//! The whole state is one flat JSON object. It is re-read on every `get`
//! so values written by another invocation are seen immediately, and
//! rewritten in full on every `set`.

use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::KeyValueStore;

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt state file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.read_all().await {
            Ok(mut map) => map.remove(key),
            Err(e) => {
                tracing::debug!(error = %e, "state file unreadable, treating as empty");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        // A corrupt file is replaced rather than blocking every future write.
        let mut map = self.read_all().await.unwrap_or_default();
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_vec_pretty(&map)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("eligibility-store-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let store = FileStore::new(scratch_path("state.json"));
        assert!(store.get("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_values_survive_a_new_store_instance() {
        let path = scratch_path("state.json");
        FileStore::new(&path).set("a", "1").await.unwrap();
        FileStore::new(&path).set("b", "2").await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("a").await.as_deref(), Some("1"));
        assert_eq!(reopened.get("b").await.as_deref(), Some("2"));
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty_and_is_replaced_on_write() {
        let path = scratch_path("state.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileStore::new(&path);
        assert!(store.get("a").await.is_none());

        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.as_deref(), Some("1"));
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
