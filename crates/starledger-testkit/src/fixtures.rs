//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use starledger::{Coordinator, IdentityProofRecord, LedgerConfig, ManualClock, VerifyOutcome};
use starledger_core::{sign_message, Address, Keypair, Payload};
use starledger_store::MemoryStore;

/// Clock reading every fixture starts at (2023-11-14T22:13:20Z).
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// A claimant keypair plus a memory-backed coordinator on a manual clock.
pub struct TestFixture {
    pub keypair: Keypair,
    pub clock: Arc<ManualClock>,
    pub coordinator: Coordinator<MemoryStore, MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self::build(Keypair::generate(), LedgerConfig::default())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::build(Keypair::from_seed(&seed), LedgerConfig::default())
    }

    /// Deterministic keypair and a custom configuration.
    pub fn with_config(seed: [u8; 32], config: LedgerConfig) -> Self {
        Self::build(Keypair::from_seed(&seed), config)
    }

    fn build(keypair: Keypair, config: LedgerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let coordinator = Coordinator::in_memory_with_clock(config, clock.clone());
        Self {
            keypair,
            clock,
            coordinator,
        }
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// Sign a challenge with the fixture's key.
    pub fn sign_challenge(&self, record: &IdentityProofRecord) -> String {
        sign_message(&self.keypair, &record.message)
    }

    /// A payload owned by the fixture's address.
    pub fn payload(&self, data: &[u8]) -> Payload {
        Payload::owned(self.address().as_str(), data.to_vec())
    }

    /// Request a challenge and answer it correctly.
    pub async fn prove(&self) -> starledger::Result<VerifyOutcome> {
        self.prove_keypair(&self.keypair).await
    }

    /// Same as [`prove`](Self::prove) for another claimant on this coordinator.
    pub async fn prove_keypair(&self, keypair: &Keypair) -> starledger::Result<VerifyOutcome> {
        let address = keypair.address();
        let record = self.coordinator.request_challenge(&address).await?;
        self.coordinator
            .verify(&address, &sign_message(keypair, &record.message))
            .await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic keypairs for multi-claimant tests.
pub fn claimants(count: usize) -> Vec<Keypair> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0x5a;
            Keypair::from_seed(&seed)
        })
        .collect()
}
