//! # Starledger
//!
//! An append-only, hash-linked ledger whose writes are gated by time-windowed
//! address proofs.
//!
//! ## Overview
//!
//! - **Ledger**: blocks linked by SHA-256 hashes, genesis at height 0
//! - **Identity proofs**: sign a challenge with the key behind an address
//!   within its window to earn one append
//! - **Coordinator**: checks the proof, appends, then consumes the proof
//!
//! ## Usage
//!
//! ```rust,no_run
//! use starledger::{Coordinator, LedgerConfig};
//! use starledger::core::{sign_message, Keypair, Payload};
//!
//! async fn example() -> starledger::Result<()> {
//!     let coordinator =
//!         Coordinator::open_sqlite("ledger.db", "proofs.db", LedgerConfig::default()).await?;
//!
//!     let keypair = Keypair::generate();
//!     let address = keypair.address();
//!
//!     let challenge = coordinator.request_challenge(&address).await?;
//!     let signature = sign_message(&keypair, &challenge.message);
//!     coordinator.verify(&address, &signature).await?;
//!
//!     let block = coordinator
//!         .submit(&address, Payload::owned(address.as_str(), b"hello".to_vec()))
//!         .await?;
//!     assert_eq!(block.height, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! The crate only emits `tracing` events. An embedding process installs a
//! subscriber once at startup:
//!
//! ```rust,no_run
//! use starledger::{init_logging, LogFormat};
//!
//! init_logging(LogFormat::Json, "info").expect("subscriber already set");
//! ```
//!
//! ## Re-exports
//!
//! - `starledger::core` - Blocks, hashing, addresses, signatures
//! - `starledger::store` - Storage abstraction and SQLite

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod proof;

// Re-export component crates
pub use starledger_core as core;
pub use starledger_store as store;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use ledger::{invalid_heights, ChainViolation, Ledger};
pub use logging::{init_logging, LogFormat};
pub use proof::{IdentityProofRecord, IdentityProofStation, ProofSession, ProofState, VerifyOutcome};

// Re-export commonly used core types
pub use starledger_core::{Address, Block, BlockHash, Payload, Star, StarRecord, StarRegistration};
