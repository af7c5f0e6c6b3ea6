//! SQLite implementation of the KvStore trait.
//!
//! This is the primary storage backend for Starledger. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Entry, KvStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok((row.get("key")?, row.get("value")?))
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let key = key.to_vec();
        let value = value.to_vec();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let key = key.to_vec();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        let key = key.to_vec();

        self.with_conn(move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }

    async fn scan(&self) -> Result<Vec<Entry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM kv ORDER BY seq")?;
            let entries = stmt
                .query_map([], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
    }

    async fn last(&self) -> Result<Option<Entry>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT key, value FROM kv ORDER BY seq DESC LIMIT 1",
                [],
                row_to_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn len(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
            u64::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative row count {}", count)))
        })
        .await
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SqliteStore::open_memory().unwrap();

        store.put(b"key", b"value").await.unwrap();
        assert_eq!(store.get(b"key").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.get(b"absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_follows_insertion_order() {
        let store = SqliteStore::open_memory().unwrap();
        store.put(b"c", b"1").await.unwrap();
        store.put(b"a", b"2").await.unwrap();
        store.put(b"b", b"3").await.unwrap();
        store.put(b"c", b"4").await.unwrap();

        let entries = store.scan().await.unwrap();
        assert_eq!(
            entries,
            vec![
                (b"c".to_vec(), b"4".to_vec()),
                (b"a".to_vec(), b"2".to_vec()),
                (b"b".to_vec(), b"3".to_vec()),
            ]
        );
        assert_eq!(store.last().await.unwrap(), Some((b"b".to_vec(), b"3".to_vec())));
        assert_eq!(store.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteStore::open_memory().unwrap();
        store.put(b"k", b"v").await.unwrap();
        store.delete(b"k").await.unwrap();
        store.delete(b"never-there").await.unwrap();

        assert_eq!(store.get(b"k").await.unwrap(), None);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(b"persisted", b"yes").await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(b"persisted").await.unwrap(),
            Some(b"yes".to_vec())
        );
    }

    mod equivalence {
        use super::*;
        use crate::memory::MemoryStore;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Put(u8, u8),
            Delete(u8),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..8, any::<u8>()).prop_map(|(k, v)| Op::Put(k, v)),
                (0u8..8).prop_map(Op::Delete),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn sqlite_matches_memory(ops in prop::collection::vec(op(), 0..40)) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                let (sqlite, memory) = rt.block_on(async {
                    let sqlite = SqliteStore::open_memory().unwrap();
                    let memory = MemoryStore::new();
                    for op in &ops {
                        match op {
                            Op::Put(k, v) => {
                                sqlite.put(&[*k], &[*v]).await.unwrap();
                                memory.put(&[*k], &[*v]).await.unwrap();
                            }
                            Op::Delete(k) => {
                                sqlite.delete(&[*k]).await.unwrap();
                                memory.delete(&[*k]).await.unwrap();
                            }
                        }
                    }
                    (sqlite.scan().await.unwrap(), memory.scan().await.unwrap())
                });
                prop_assert_eq!(sqlite, memory);
            }
        }
    }
}
