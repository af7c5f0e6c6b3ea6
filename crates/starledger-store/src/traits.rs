//! KvStore trait: the abstract interface for ordered key-value persistence.
//!
//! This trait keeps the ledger and the proof station storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;

use crate::error::Result;

/// A stored key and its value.
pub type Entry = (Vec<u8>, Vec<u8>);

/// The KvStore trait: async interface for an ordered, durable key-value map.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic puts**: A reader sees either the old value or the new one, never
///   a partial write.
/// - **Insertion order**: `scan` and `last` follow the order in which keys were
///   first inserted. Overwriting a key keeps its original position.
/// - **No retries**: Backend failures surface unchanged to the caller.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Insert or overwrite the value at `key`.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Get the value at `key`.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &[u8]) -> Result<()>;

    /// Every entry, in insertion order.
    async fn scan(&self) -> Result<Vec<Entry>>;

    /// The most recently inserted entry.
    async fn last(&self) -> Result<Option<Entry>>;

    /// Number of entries.
    async fn len(&self) -> Result<u64>;

    /// Whether the store holds no entries.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl<S: KvStore + ?Sized> KvStore for std::sync::Arc<S> {
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key).await
    }

    async fn scan(&self) -> Result<Vec<Entry>> {
        (**self).scan().await
    }

    async fn last(&self) -> Result<Option<Entry>> {
        (**self).last().await
    }

    async fn len(&self) -> Result<u64> {
        (**self).len().await
    }
}

/// Encode a height as an order-preserving key.
///
/// Big-endian bytes sort the same way the integers do.
pub fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// Decode a key written by [`height_key`].
pub fn parse_height_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
