//! Resource storage module
//!
//! Every resource route reads and writes through the `ResourceStore` trait,
//! so handlers never touch the filesystem directly and tests can swap the
//! file-backed store for an in-memory one.

mod file;
#[cfg(test)]
mod memory;

use async_trait::async_trait;
use hyper::body::Bytes;
use thiserror::Error;

pub use file::FileStore;
#[cfg(test)]
pub use memory::MemoryStore;

/// Storage failures surfaced to handlers
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not part of the configured resource set
    #[error("unknown resource key '{key}'")]
    UnknownKey { key: String },
    /// The underlying file operation failed
    #[error("I/O error on resource '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Key-based storage for resource payloads
///
/// Payload bytes are opaque: they are stored and returned exactly as
/// written, never parsed or validated. `read` returns `Ok(None)` while a
/// resource has never been written.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
}
