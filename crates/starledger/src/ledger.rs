//! The Ledger: an append-only, hash-linked chain of blocks.
//!
//! Blocks live in a [`KvStore`] keyed by big-endian height, so insertion
//! order and height order coincide. The ledger is the single writer of that
//! store; appends are serialized by an internal lock and reads run freely.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use starledger_core::{
    validate_block_hash, validate_link, Block, BlockHash, Payload, ValidationError,
};
use starledger_store::{height_key, parse_height_key, KvStore};

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::{Error, Result};

/// A chain integrity finding produced by [`Ledger::validate_chain`].
pub type ChainViolation = ValidationError;

/// Sorted, de-duplicated heights named by a set of findings.
pub fn invalid_heights(violations: &[ChainViolation]) -> Vec<u64> {
    let mut heights: Vec<u64> = violations.iter().map(ChainViolation::height).collect();
    heights.sort_unstable();
    heights.dedup();
    heights
}

/// The ledger engine.
pub struct Ledger<S: KvStore> {
    store: S,
    clock: Arc<dyn Clock>,
    genesis_body: String,
    /// Held for the whole read-height / seal / write sequence of an append.
    append_lock: Mutex<()>,
}

impl<S: KvStore> Ledger<S> {
    /// Create a ledger over `store`.
    ///
    /// Nothing is written until [`initialize`](Self::initialize) or the first
    /// [`append`](Self::append).
    pub fn new(store: S, clock: Arc<dyn Clock>, config: &LedgerConfig) -> Self {
        Self {
            store,
            clock,
            genesis_body: config.genesis_body.clone(),
            append_lock: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create the genesis block if the ledger is empty.
    ///
    /// Idempotent: later calls return the existing genesis block.
    pub async fn initialize(&self) -> Result<Block> {
        let _guard = self.append_lock.lock().await;
        let head = self.head_or_genesis().await?;
        if head.is_genesis() {
            return Ok(head);
        }
        self.get_by_height(0)
            .await?
            .ok_or_else(|| Error::NotFound("genesis block".into()))
    }

    /// Append a block carrying `payload` and return it.
    ///
    /// On an empty ledger the genesis block is written first, so the first
    /// payload lands at height 1.
    pub async fn append(&self, payload: Payload) -> Result<Block> {
        let _guard = self.append_lock.lock().await;

        let head = self.head_or_genesis().await?;
        let block = Block::seal(
            head.height + 1,
            self.clock.now_secs(),
            Some(head.hash),
            payload,
        );
        debug_assert_eq!(block.height, head.height + 1);

        self.write_block(&block).await?;
        info!(height = block.height, hash = %block.hash, "appended block");
        Ok(block)
    }

    /// Current head, writing genesis if there is none. Caller holds the lock.
    async fn head_or_genesis(&self) -> Result<Block> {
        if let Some(head) = self.head().await? {
            return Ok(head);
        }

        let genesis = Block::seal(
            0,
            self.clock.now_secs(),
            None,
            Payload::unowned(self.genesis_body.clone().into_bytes()),
        );
        self.write_block(&genesis).await?;
        info!(hash = %genesis.hash, "genesis block added");
        Ok(genesis)
    }

    async fn write_block(&self, block: &Block) -> Result<()> {
        let bytes = block.to_bytes()?;
        self.store
            .put(&height_key(block.height), &bytes)
            .await
            .map_err(Error::StoreWrite)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Height of the latest block, or `None` if not even genesis exists.
    pub async fn current_height(&self) -> Result<Option<u64>> {
        let last = self.store.last().await.map_err(Error::StoreRead)?;
        match last {
            None => Ok(None),
            Some((key, value)) => match parse_height_key(&key) {
                Some(height) => Ok(Some(height)),
                None => Ok(Some(Block::from_bytes(&value)?.height)),
            },
        }
    }

    /// The latest block.
    pub async fn head(&self) -> Result<Option<Block>> {
        let last = self.store.last().await.map_err(Error::StoreRead)?;
        last.map(|(_, value)| Block::from_bytes(&value).map_err(Error::from))
            .transpose()
    }

    /// Get the block at `height`.
    pub async fn get_by_height(&self, height: u64) -> Result<Option<Block>> {
        let value = self
            .store
            .get(&height_key(height))
            .await
            .map_err(Error::StoreRead)?;
        value
            .map(|v| Block::from_bytes(&v).map_err(Error::from))
            .transpose()
    }

    /// Find the block whose hash is `hash`.
    ///
    /// Scans forward from genesis; hashes are unique by construction, so the
    /// first match is the only one.
    pub async fn get_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>> {
        for block in self.blocks().await? {
            if &block.hash == hash {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }

    /// All blocks registered by `owner`, in height order.
    pub async fn get_by_owner(&self, owner: &str) -> Result<Vec<Block>> {
        Ok(self
            .blocks()
            .await?
            .into_iter()
            .filter(|block| block.owner() == Some(owner))
            .collect())
    }

    /// Every block, in height order.
    pub async fn blocks(&self) -> Result<Vec<Block>> {
        let entries = self.store.scan().await.map_err(Error::StoreRead)?;
        entries
            .iter()
            .map(|(_, value)| Block::from_bytes(value).map_err(Error::from))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Recompute the hash of the block at `height` and compare it to the
    /// stored one.
    pub async fn validate_block(&self, height: u64) -> Result<bool> {
        let block = self
            .get_by_height(height)
            .await?
            .ok_or_else(|| Error::NotFound(format!("block at height {}", height)))?;

        match validate_block_hash(&block) {
            Ok(()) => Ok(true),
            Err(finding) => {
                warn!(height, %finding, "block failed validation");
                Ok(false)
            }
        }
    }

    /// Check every block's hash and every link between neighbours.
    ///
    /// Purely diagnostic: nothing is repaired or rewritten. An empty result
    /// means the chain is intact.
    pub async fn validate_chain(&self) -> Result<Vec<ChainViolation>> {
        let entries = self.store.scan().await.map_err(Error::StoreRead)?;
        let mut violations = Vec::new();
        // Previous block and the height it is stored under.
        let mut prev: Option<(u64, Block)> = None;

        for (position, (key, value)) in entries.iter().enumerate() {
            let key_height = parse_height_key(key).unwrap_or(position as u64);

            let block = match Block::from_bytes(value) {
                Ok(block) => block,
                Err(e) => {
                    violations.push(ValidationError::Corrupt {
                        key: key_height,
                        reason: e.to_string(),
                    });
                    prev = None;
                    continue;
                }
            };

            if block.height != key_height {
                violations.push(ValidationError::HeightMismatch {
                    key: key_height,
                    claimed: block.height,
                });
            }
            if let Err(finding) = validate_block_hash(&block) {
                violations.push(finding.with_height(key_height));
            }
            if let Some((prev_height, prev)) = &prev {
                if let Err(finding) = validate_link(prev, &block) {
                    violations.push(finding.with_height(*prev_height));
                }
            }

            prev = Some((key_height, block));
        }

        if violations.is_empty() {
            debug!(blocks = entries.len(), "no errors detected");
        } else {
            warn!(
                errors = violations.len(),
                heights = ?invalid_heights(&violations),
                "chain validation found errors"
            );
        }

        Ok(violations)
    }
}
