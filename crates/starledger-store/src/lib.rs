//! # Starledger Store
//!
//! Storage abstraction for Starledger. Provides a trait-based interface for
//! an ordered key-value store with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`KvStore`] trait,
//! allowing the ledger and the proof station to be storage-agnostic. The
//! primary implementation is [`SqliteStore`], with [`MemoryStore`] for
//! testing. Each component owns its own store instance.
//!
//! ## Key Types
//!
//! - [`KvStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use starledger_store::{height_key, KvStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("chain.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     store.put(&height_key(0), b"genesis").await.unwrap();
//!     let entries = store.scan().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Insertion order**: Scans return entries in first-insertion order
//! - **Atomic puts**: A put is never observed half-written
//! - **No retries**: Backend errors surface unchanged

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{height_key, parse_height_key, Entry, KvStore};
