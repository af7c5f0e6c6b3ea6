//! The Coordinator: unified API for Starledger.
//!
//! Owns one [`Ledger`] and one [`IdentityProofStation`] and is the only piece
//! that touches both. A submission goes through "check proof, append block,
//! consume proof" under the submitting address's lock, so one proof gates
//! at most one append.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use starledger_core::{Address, Block, BlockHash, Payload, StarRegistration};
use starledger_store::{KvStore, MemoryStore, SqliteStore};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::ledger::{ChainViolation, Ledger};
use crate::proof::{IdentityProofRecord, IdentityProofStation, VerifyOutcome};

/// The main Coordinator struct.
///
/// Provides a unified API for:
/// - Issuing and verifying address challenges
/// - Appending proof-gated blocks
/// - Querying and validating the chain
pub struct Coordinator<L: KvStore, P: KvStore> {
    ledger: Ledger<L>,
    station: IdentityProofStation<P>,
}

impl Coordinator<MemoryStore, MemoryStore> {
    /// A coordinator over two fresh in-memory stores and the system clock.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    /// A coordinator over two fresh in-memory stores and the given clock.
    pub fn in_memory_with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_stores(MemoryStore::new(), MemoryStore::new(), clock, &config)
    }
}

impl Coordinator<SqliteStore, SqliteStore> {
    /// Open (or create) the ledger and proof databases.
    ///
    /// The genesis block is written here if the ledger is empty.
    pub async fn open_sqlite(
        ledger_path: impl AsRef<Path>,
        proof_path: impl AsRef<Path>,
        config: LedgerConfig,
    ) -> Result<Self> {
        let ledger_store = SqliteStore::open(ledger_path).map_err(Error::StoreOpen)?;
        let proof_store = SqliteStore::open(proof_path).map_err(Error::StoreOpen)?;

        let coordinator =
            Self::from_stores(ledger_store, proof_store, Arc::new(SystemClock), &config);
        coordinator.ledger.initialize().await?;
        Ok(coordinator)
    }
}

impl<L: KvStore, P: KvStore> Coordinator<L, P> {
    /// Assemble a coordinator from already-built components.
    pub fn new(ledger: Ledger<L>, station: IdentityProofStation<P>) -> Self {
        Self { ledger, station }
    }

    /// Build both components over the given stores, sharing one clock.
    pub fn from_stores(
        ledger_store: L,
        proof_store: P,
        clock: Arc<dyn Clock>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            ledger: Ledger::new(ledger_store, Arc::clone(&clock), config),
            station: IdentityProofStation::new(proof_store, clock, config),
        }
    }

    pub fn ledger(&self) -> &Ledger<L> {
        &self.ledger
    }

    pub fn station(&self) -> &IdentityProofStation<P> {
        &self.station
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────────

    /// Append `payload` on behalf of a proven `address`.
    ///
    /// Fails with [`Error::ProofRequired`] without touching the ledger if the
    /// address holds no valid proof. If the append fails the proof is kept.
    /// If the append succeeds but consuming the proof fails, the block stands
    /// and the failure is only logged.
    pub async fn submit(&self, address: &Address, payload: Payload) -> Result<Block> {
        let session = self.station.session(address).await;

        if !session.is_proven().await? {
            return Err(Error::ProofRequired(address.clone()));
        }

        let block = self.ledger.append(payload).await?;

        if let Err(e) = session.consume().await {
            warn!(%address, height = block.height, error = %e, "proof not consumed after append");
        }
        Ok(block)
    }

    /// Validate a star registration and submit it for `address`.
    pub async fn submit_star(
        &self,
        address: &Address,
        registration: StarRegistration,
    ) -> Result<Block> {
        if &registration.address != address {
            return Err(Error::InvalidPayload(format!(
                "registration is for {}, not {}",
                registration.address, address
            )));
        }
        let payload = registration
            .into_payload()
            .map_err(|e| Error::InvalidPayload(e.to_string()))?;
        self.submit(address, payload).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Proofs
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn request_challenge(&self, address: &Address) -> Result<IdentityProofRecord> {
        self.station.request_challenge(address).await
    }

    pub async fn verify(&self, address: &Address, signature: &str) -> Result<VerifyOutcome> {
        self.station.verify(address, signature).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_by_height(&self, height: u64) -> Result<Option<Block>> {
        self.ledger.get_by_height(height).await
    }

    pub async fn get_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>> {
        self.ledger.get_by_hash(hash).await
    }

    pub async fn get_by_owner(&self, owner: &Address) -> Result<Vec<Block>> {
        self.ledger.get_by_owner(owner.as_str()).await
    }

    pub async fn current_height(&self) -> Result<Option<u64>> {
        self.ledger.current_height().await
    }

    pub async fn validate_chain(&self) -> Result<Vec<ChainViolation>> {
        self.ledger.validate_chain().await
    }
}
