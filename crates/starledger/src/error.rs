//! Error types for Starledger.

use starledger_core::{Address, CoreError};
use starledger_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the ledger, the proof station and the coordinator.
///
/// Store failures are split by direction so a caller can tell a failed
/// lookup from a failed write. Neither is retried here.
#[derive(Debug, Error)]
pub enum Error {
    /// No record at the requested height, hash or address.
    #[error("not found: {0}")]
    NotFound(String),

    /// A submission arrived without a valid, unexpired proof.
    #[error("address {0} has no valid proof")]
    ProofRequired(Address),

    /// A store could not be opened or migrated.
    #[error("store open failed: {0}")]
    StoreOpen(#[source] StoreError),

    /// The store failed while reading.
    #[error("store read failed: {0}")]
    StoreRead(#[source] StoreError),

    /// The store rejected a write.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// A stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CoreError),

    /// A payload failed schema validation.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type for Starledger operations.
pub type Result<T> = std::result::Result<T, Error>;
