//! In-memory resource store for tests
//!
//! Mirrors `FileStore` semantics without touching disk: a key that was never
//! written reads back as `None`, a write fully replaces the stored bytes,
//! and keys outside the seeded set are rejected.

use std::collections::HashMap;

use async_trait::async_trait;
use hyper::body::Bytes;
use tokio::sync::RwLock;

use super::{ResourceStore, StoreError};

pub struct MemoryStore {
    entries: RwLock<HashMap<String, Option<Bytes>>>,
}

impl MemoryStore {
    /// Pre-seed the store with the configured keys, all unwritten
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let entries = keys.into_iter().map(|key| (key, None)).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(value) => Ok(value.clone()),
            None => Err(StoreError::UnknownKey {
                key: key.to_string(),
            }),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(value) => {
                *value = Some(Bytes::copy_from_slice(data));
                Ok(())
            }
            None => Err(StoreError::UnknownKey {
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(["chat_history".to_string(), "atividades".to_string()])
    }

    #[tokio::test]
    async fn test_seeded_key_reads_none_until_written() {
        let store = store();
        assert_eq!(store.read("chat_history").await.expect("read"), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = store();
        store.write("atividades", b"[1]").await.expect("write");
        assert_eq!(
            store.read("atividades").await.expect("read"),
            Some(Bytes::from_static(b"[1]"))
        );
    }

    #[tokio::test]
    async fn test_write_replaces_previous_value() {
        let store = store();
        store.write("atividades", b"[1,2,3]").await.expect("write");
        store.write("atividades", b"[]").await.expect("write");
        assert_eq!(
            store.read("atividades").await.expect("read"),
            Some(Bytes::from_static(b"[]"))
        );
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected() {
        let store = store();
        assert!(matches!(
            store.read("nope").await,
            Err(StoreError::UnknownKey { .. })
        ));
        assert!(matches!(
            store.write("nope", b"{}").await,
            Err(StoreError::UnknownKey { .. })
        ));
    }
}
