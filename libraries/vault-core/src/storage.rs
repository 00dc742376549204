//! Key-value preference storage

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Persisted client preferences (volume, queue snapshot)
///
/// Values are JSON documents stored under string keys.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read the value stored under `key`
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, used when nothing should outlive the process
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.load("volume").await.unwrap(), None);

        store.save("volume", "0.5").await.unwrap();
        assert_eq!(store.load("volume").await.unwrap().as_deref(), Some("0.5"));

        store.remove("volume").await.unwrap();
        assert_eq!(store.load("volume").await.unwrap(), None);
    }
}
