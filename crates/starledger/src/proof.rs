//! The IdentityProofStation: time-windowed address proofs.
//!
//! A claimant asks for a challenge, signs its message with the key behind
//! the address, and submits the signature. A record that reached `Valid`
//! inside its window gates exactly one ledger append, after which the
//! coordinator consumes it.
//!
//! Expiry is evaluated lazily against the clock on each call. Nothing is
//! evicted in the background; [`IdentityProofStation::sweep_expired`] is
//! there for a caller that wants bounded storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use starledger_core::{challenge_message, verify_message, Address, CoreError};
use starledger_store::KvStore;

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::{Error, Result};

/// Where a proof record stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofState {
    /// Issued, not yet answered.
    Pending,
    /// Answered with a good signature inside the window.
    Valid,
    /// Answered with a bad signature. May be retried while the window is open.
    Invalid,
    /// The window elapsed before a good signature arrived.
    Expired,
}

/// A challenge issued to one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProofRecord {
    pub address: Address,
    /// The exact text the claimant must sign.
    pub message: String,
    /// Issue time, Unix milliseconds.
    pub issued_at: i64,
    /// End of the window, Unix milliseconds. Fixed at issue.
    pub expires_at: i64,
    /// Whole seconds left in the window as of the last observation.
    pub window_seconds: u64,
    pub state: ProofState,
}

impl IdentityProofRecord {
    /// Whether the window has elapsed at `now_millis`.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis > self.expires_at
    }

    /// Whole seconds left in the window at `now_millis`, never negative.
    pub fn remaining_secs(&self, now_millis: i64) -> u64 {
        let left = self.expires_at.saturating_sub(now_millis).max(0);
        (left / 1000) as u64
    }

    /// Whether this record currently authorizes an append.
    pub fn is_proven(&self, now_millis: i64) -> bool {
        self.state == ProofState::Valid && !self.is_expired(now_millis)
    }

    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

/// Result of a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Whether the address is now proven.
    pub proven: bool,
    /// The record after the attempt.
    pub record: IdentityProofRecord,
}

/// Issues challenges and checks their answers.
pub struct IdentityProofStation<S: KvStore> {
    store: S,
    clock: Arc<dyn Clock>,
    window_millis: i64,
    domain_tag: String,
    /// One async lock per address with a session open or waiting.
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<S: KvStore> IdentityProofStation<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, config: &LedgerConfig) -> Self {
        Self {
            store,
            clock,
            window_millis: config.proof_window_millis(),
            domain_tag: config.domain_tag.clone(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lock `address` for a sequence of operations.
    ///
    /// Every public operation takes this lock for its own duration; holding a
    /// session keeps other callers off the address until it is dropped.
    pub async fn session(&self, address: &Address) -> ProofSession<'_, S> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(address.as_str().to_owned()).or_default())
        };
        ProofSession {
            station: self,
            address: address.clone(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Issue a challenge, or return the live one with its window recomputed.
    pub async fn request_challenge(&self, address: &Address) -> Result<IdentityProofRecord> {
        self.session(address).await.request_challenge().await
    }

    /// Check `signature` against the address's current challenge.
    pub async fn verify(&self, address: &Address, signature: &str) -> Result<VerifyOutcome> {
        self.session(address).await.verify(signature).await
    }

    /// True iff the address holds a `Valid`, unexpired record.
    pub async fn is_proven(&self, address: &Address) -> Result<bool> {
        self.session(address).await.is_proven().await
    }

    /// Delete the address's record. Absent records are fine.
    pub async fn consume(&self, address: &Address) -> Result<()> {
        self.session(address).await.consume().await
    }

    /// Current record for the address, as stored.
    pub async fn get(&self, address: &Address) -> Result<Option<IdentityProofRecord>> {
        self.load(address).await
    }

    /// Delete every record whose window has elapsed. Returns how many went.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let now = self.clock.now_millis();
        let entries = self.store.scan().await.map_err(Error::StoreRead)?;

        let mut removed = 0;
        for (key, value) in entries {
            let record = IdentityProofRecord::from_bytes(&value)?;
            if !record.is_expired(now) {
                continue;
            }
            // Re-check under the address lock; a refresh may have landed.
            let session = self.session(&record.address).await;
            if let Some(current) = session.get().await? {
                if current.is_expired(now) {
                    self.store.delete(&key).await.map_err(Error::StoreWrite)?;
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!(removed, "swept expired proof records");
        }
        Ok(removed)
    }

    /// Forget the address's lock if the releasing session is its last user.
    fn release(&self, address: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one in the releasing session's guard.
        if locks.get(address).is_some_and(|lock| Arc::strong_count(lock) <= 2) {
            locks.remove(address);
        }
    }

    async fn load(&self, address: &Address) -> Result<Option<IdentityProofRecord>> {
        let value = self
            .store
            .get(address.as_str().as_bytes())
            .await
            .map_err(Error::StoreRead)?;
        value
            .map(|v| IdentityProofRecord::from_bytes(&v).map_err(Error::from))
            .transpose()
    }

    async fn save(&self, record: &IdentityProofRecord) -> Result<()> {
        let bytes = record.to_bytes()?;
        self.store
            .put(record.address.as_str().as_bytes(), &bytes)
            .await
            .map_err(Error::StoreWrite)
    }
}

/// Exclusive access to one address's proof record.
pub struct ProofSession<'a, S: KvStore> {
    station: &'a IdentityProofStation<S>,
    address: Address,
    _guard: OwnedMutexGuard<()>,
}

impl<S: KvStore> Drop for ProofSession<'_, S> {
    fn drop(&mut self) {
        self.station.release(self.address.as_str());
    }
}

impl<S: KvStore> ProofSession<'_, S> {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub async fn get(&self) -> Result<Option<IdentityProofRecord>> {
        self.station.load(&self.address).await
    }

    pub async fn request_challenge(&self) -> Result<IdentityProofRecord> {
        let station = self.station;
        let now = station.clock.now_millis();

        if let Some(mut record) = self.get().await? {
            if !record.is_expired(now) {
                record.window_seconds = record.remaining_secs(now);
                station.save(&record).await?;
                debug!(address = %self.address, window = record.window_seconds, "challenge still live");
                return Ok(record);
            }
        }

        let expires_at = now.saturating_add(station.window_millis);
        let record = IdentityProofRecord {
            address: self.address.clone(),
            message: challenge_message(&self.address, now, &station.domain_tag),
            issued_at: now,
            expires_at,
            window_seconds: ((expires_at - now) / 1000) as u64,
            state: ProofState::Pending,
        };
        station.save(&record).await?;
        debug!(address = %self.address, issued_at = now, "issued challenge");
        Ok(record)
    }

    pub async fn verify(&self, signature: &str) -> Result<VerifyOutcome> {
        let station = self.station;
        let now = station.clock.now_millis();

        let mut record = self
            .get()
            .await?
            .ok_or_else(|| Error::NotFound(format!("challenge for {}", self.address)))?;

        if record.state == ProofState::Valid {
            return Ok(VerifyOutcome {
                proven: record.is_proven(now),
                record,
            });
        }

        if record.is_expired(now) {
            record.state = ProofState::Expired;
            record.window_seconds = 0;
            station.save(&record).await?;
            warn!(address = %self.address, "challenge expired before verification");
            return Ok(VerifyOutcome {
                proven: false,
                record,
            });
        }

        let ok = verify_message(&self.address, &record.message, signature);
        record.state = if ok {
            ProofState::Valid
        } else {
            ProofState::Invalid
        };
        record.window_seconds = record.remaining_secs(now);
        station.save(&record).await?;

        if ok {
            info!(address = %self.address, "address proven");
        } else {
            warn!(address = %self.address, "signature rejected");
        }
        Ok(VerifyOutcome { proven: ok, record })
    }

    pub async fn is_proven(&self) -> Result<bool> {
        let now = self.station.clock.now_millis();
        Ok(self
            .get()
            .await?
            .map(|record| record.is_proven(now))
            .unwrap_or(false))
    }

    pub async fn consume(&self) -> Result<()> {
        self.station
            .store
            .delete(self.address.as_str().as_bytes())
            .await
            .map_err(Error::StoreWrite)?;
        debug!(address = %self.address, "proof consumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use starledger_core::{sign_message, Keypair};
    use starledger_store::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    fn station() -> (IdentityProofStation<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(T0));
        let station =
            IdentityProofStation::new(MemoryStore::new(), clock.clone(), &LedgerConfig::default());
        (station, clock)
    }

    fn keypair() -> Keypair {
        Keypair::from_seed(&[7u8; 32])
    }

    #[tokio::test]
    async fn test_fresh_challenge() {
        let (station, _) = station();
        let address = keypair().address();
        let record = station.request_challenge(&address).await.unwrap();

        assert_eq!(record.state, ProofState::Pending);
        assert_eq!(record.issued_at, T0);
        assert_eq!(record.window_seconds, 300);
        assert_eq!(record.message, format!("{}:{}:starRegistry", address, T0));
    }

    #[tokio::test]
    async fn test_rerequest_keeps_message_and_shrinks_window() {
        let (station, clock) = station();
        let address = keypair().address();
        let first = station.request_challenge(&address).await.unwrap();

        clock.advance_secs(100);
        let second = station.request_challenge(&address).await.unwrap();
        clock.advance_millis(500);
        let third = station.request_challenge(&address).await.unwrap();

        assert_eq!(first.message, second.message);
        assert_eq!(second.message, third.message);
        assert_eq!(second.issued_at, first.issued_at);
        assert_eq!(second.window_seconds, 200);
        assert!(third.window_seconds <= second.window_seconds);
    }

    #[tokio::test]
    async fn test_verify_inside_window_then_fresh_cycle() {
        let (station, clock) = station();
        let keypair = keypair();
        let address = keypair.address();

        let record = station.request_challenge(&address).await.unwrap();
        let signature = sign_message(&keypair, &record.message);

        clock.set_millis(T0 + 299_000);
        let outcome = station.verify(&address, &signature).await.unwrap();
        assert!(outcome.proven);
        assert_eq!(outcome.record.state, ProofState::Valid);
        assert_eq!(outcome.record.window_seconds, 1);

        clock.set_millis(T0 + 301_000);
        assert!(!station.is_proven(&address).await.unwrap());

        let fresh = station.request_challenge(&address).await.unwrap();
        assert_ne!(fresh.message, record.message);
        assert_eq!(fresh.state, ProofState::Pending);

        let stale = station.verify(&address, &signature).await.unwrap();
        assert!(!stale.proven);
        assert_eq!(stale.record.state, ProofState::Invalid);
    }

    #[tokio::test]
    async fn test_verify_after_expiry_never_valid() {
        let (station, clock) = station();
        let keypair = keypair();
        let address = keypair.address();

        let record = station.request_challenge(&address).await.unwrap();
        let signature = sign_message(&keypair, &record.message);

        clock.advance_secs(301);
        let outcome = station.verify(&address, &signature).await.unwrap();
        assert!(!outcome.proven);
        assert_eq!(outcome.record.state, ProofState::Expired);
        assert_eq!(outcome.record.window_seconds, 0);
    }

    #[tokio::test]
    async fn test_window_boundary_is_inclusive() {
        let (station, clock) = station();
        let keypair = keypair();
        let address = keypair.address();

        let record = station.request_challenge(&address).await.unwrap();
        clock.advance_secs(300);
        let outcome = station
            .verify(&address, &sign_message(&keypair, &record.message))
            .await
            .unwrap();
        assert!(outcome.proven);
    }

    #[tokio::test]
    async fn test_malformed_signature_is_invalid_not_error() {
        let (station, _) = station();
        let address = keypair().address();
        station.request_challenge(&address).await.unwrap();

        let forged = "ab".repeat(64);
        for signature in ["", "zz", "00", forged.as_str()] {
            let outcome = station.verify(&address, signature).await.unwrap();
            assert!(!outcome.proven);
            assert_eq!(outcome.record.state, ProofState::Invalid);
        }
    }

    #[tokio::test]
    async fn test_invalid_can_be_retried_inside_window() {
        let (station, _) = station();
        let keypair = keypair();
        let address = keypair.address();
        let record = station.request_challenge(&address).await.unwrap();

        let other = Keypair::from_seed(&[8u8; 32]);
        let wrong = station
            .verify(&address, &sign_message(&other, &record.message))
            .await
            .unwrap();
        assert_eq!(wrong.record.state, ProofState::Invalid);

        let right = station
            .verify(&address, &sign_message(&keypair, &record.message))
            .await
            .unwrap();
        assert!(right.proven);
    }

    #[tokio::test]
    async fn test_verify_on_valid_record_is_idempotent() {
        let (station, clock) = station();
        let keypair = keypair();
        let address = keypair.address();
        let record = station.request_challenge(&address).await.unwrap();
        let first = station
            .verify(&address, &sign_message(&keypair, &record.message))
            .await
            .unwrap();

        clock.advance_secs(10);
        let again = station.verify(&address, "not even hex").await.unwrap();
        assert!(again.proven);
        assert_eq!(again.record, first.record);
    }

    #[tokio::test]
    async fn test_verify_without_challenge_is_not_found() {
        let (station, _) = station();
        let err = station
            .verify(&keypair().address(), "00")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_consume() {
        let (station, _) = station();
        let keypair = keypair();
        let address = keypair.address();
        let record = station.request_challenge(&address).await.unwrap();
        station
            .verify(&address, &sign_message(&keypair, &record.message))
            .await
            .unwrap();

        station.consume(&address).await.unwrap();
        assert!(!station.is_proven(&address).await.unwrap());
        assert!(station.get(&address).await.unwrap().is_none());

        // Absent record: no-op.
        station.consume(&address).await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let (station, clock) = station();
        let old = Keypair::from_seed(&[1u8; 32]).address();
        let young = Keypair::from_seed(&[2u8; 32]).address();

        station.request_challenge(&old).await.unwrap();
        clock.advance_secs(200);
        station.request_challenge(&young).await.unwrap();
        clock.advance_secs(150);

        assert_eq!(station.sweep_expired().await.unwrap(), 1);
        assert!(station.get(&old).await.unwrap().is_none());
        assert!(station.get(&young).await.unwrap().is_some());
    }

    fn lock_count<S: KvStore>(station: &IdentityProofStation<S>) -> usize {
        station.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_idle_addresses_leave_no_locks() {
        let (station, _) = station();
        for i in 0..1000 {
            let address = Address::new(format!("unknown-{}", i));
            assert!(!station.is_proven(&address).await.unwrap());
        }

        let keypair = keypair();
        let address = keypair.address();
        let record = station.request_challenge(&address).await.unwrap();
        station
            .verify(&address, &sign_message(&keypair, &record.message))
            .await
            .unwrap();
        station.consume(&address).await.unwrap();

        assert!(station.store().is_empty().await.unwrap());
        assert_eq!(lock_count(&station), 0);
    }

    #[tokio::test]
    async fn test_held_session_keeps_its_lock() {
        let (station, _) = station();
        let station = Arc::new(station);
        let address = keypair().address();

        let session = station.session(&address).await;
        let waiter = {
            let station = Arc::clone(&station);
            let address = address.clone();
            tokio::spawn(async move { station.request_challenge(&address).await })
        };
        tokio::task::yield_now().await;

        assert_eq!(lock_count(&station), 1);
        assert!(!waiter.is_finished());
        assert!(session.get().await.unwrap().is_none());

        drop(session);
        let record = waiter.await.unwrap().unwrap();
        assert_eq!(record.state, ProofState::Pending);
        assert_eq!(lock_count(&station), 0);
    }

    #[test]
    fn test_remaining_secs_clamps() {
        let record = IdentityProofRecord {
            address: Address::from("a"),
            message: String::new(),
            issued_at: 0,
            expires_at: 300_000,
            window_seconds: 300,
            state: ProofState::Pending,
        };
        assert_eq!(record.remaining_secs(0), 300);
        assert_eq!(record.remaining_secs(299_001), 0);
        assert_eq!(record.remaining_secs(400_000), 0);
        assert!(!record.is_expired(300_000));
        assert!(record.is_expired(300_001));
    }
}
