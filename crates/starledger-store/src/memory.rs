//! In-memory implementation of the KvStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::traits::{Entry, KvStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Entries keyed by insertion sequence.
    entries: BTreeMap<u64, Entry>,

    /// Position index: key -> insertion sequence.
    positions: HashMap<Vec<u8>, u64>,

    /// Next insertion sequence.
    next_seq: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut inner = self.write()?;

        if let Some(&seq) = inner.positions.get(key) {
            inner.entries.insert(seq, (key.to_vec(), value.to_vec()));
            return Ok(());
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.positions.insert(key.to_vec(), seq);
        inner.entries.insert(seq, (key.to_vec(), value.to_vec()));
        Ok(())
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.read()?;
        Ok(inner
            .positions
            .get(key)
            .and_then(|seq| inner.entries.get(seq))
            .map(|(_, value)| value.clone()))
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(seq) = inner.positions.remove(key) {
            inner.entries.remove(&seq);
        }
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Entry>> {
        let inner = self.read()?;
        Ok(inner.entries.values().cloned().collect())
    }

    async fn last(&self) -> Result<Option<Entry>> {
        let inner = self.read()?;
        Ok(inner.entries.values().next_back().cloned())
    }

    async fn len(&self) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.entries.len() as u64)
    }
}
