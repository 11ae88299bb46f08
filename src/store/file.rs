//! File-backed resource store
//!
//! One flat file per resource key under the configured data directory. The
//! file on disk is the sole source of truth: nothing is cached between
//! requests. A per-key `RwLock` serializes writers against readers and each
//! other, so concurrent overwrites cannot interleave within a file and a
//! read sees either the complete old or complete new content.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hyper::body::Bytes;
use tokio::fs;
use tokio::sync::RwLock;

use super::{ResourceStore, StoreError};

struct FileEntry {
    path: PathBuf,
    lock: RwLock<()>,
}

/// Production store persisting each resource to a single file
pub struct FileStore {
    entries: HashMap<String, FileEntry>,
}

impl FileStore {
    /// Build a store rooted at `data_dir` with one `(key, file name)` entry
    /// per configured resource. Creates the directory if it does not exist.
    pub fn new(data_dir: &str, entries: Vec<(String, String)>) -> std::io::Result<Self> {
        let root = Path::new(data_dir);
        if !root.as_os_str().is_empty() {
            std::fs::create_dir_all(root)?;
        }

        let entries = entries
            .into_iter()
            .map(|(key, file)| {
                let entry = FileEntry {
                    path: root.join(file),
                    lock: RwLock::new(()),
                };
                (key, entry)
            })
            .collect();

        Ok(Self { entries })
    }

    fn entry(&self, key: &str) -> Result<&FileEntry, StoreError> {
        self.entries.get(key).ok_or_else(|| StoreError::UnknownKey {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl ResourceStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let entry = self.entry(key)?;
        let _guard = entry.lock.read().await;

        match fs::read(&entry.path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            // A resource that was never written is not an error
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let entry = self.entry(key)?;
        let _guard = entry.lock.write().await;

        // Creates the file on first write, truncates and overwrites afterwards
        fs::write(&entry.path, data)
            .await
            .map_err(|e| StoreError::Io {
                key: key.to_string(),
                source: e,
            })
    }
}
