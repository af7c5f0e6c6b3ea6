//! Block: one immutable record of the ledger.
//!
//! A block is sealed once, when it is appended. Its hash covers every other
//! field, including the hash of its predecessor, which is what links the chain.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_bytes;
use crate::crypto::Sha256Hash;
use crate::error::CoreError;
use crate::types::BlockHash;

/// The opaque body a block carries.
///
/// The ledger never interprets `data`. `owner` is the one field it indexes,
/// so owner lookups work without knowing the payload schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// The address that registered this record, if any.
    pub owner: Option<String>,

    /// Application bytes.
    pub data: Bytes,
}

impl Payload {
    /// A payload owned by `owner`.
    pub fn owned(owner: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            owner: Some(owner.into()),
            data: data.into(),
        }
    }

    /// A payload with no owner, like the genesis body.
    pub fn unowned(data: impl Into<Bytes>) -> Self {
        Self {
            owner: None,
            data: data.into(),
        }
    }
}

/// A hash-linked ledger block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub height: u64,

    /// Seconds since the Unix epoch, assigned at append time.
    pub timestamp: i64,

    /// Hash of the block at `height - 1`; `None` for genesis.
    pub previous_hash: Option<BlockHash>,

    /// SHA-256 over the canonical encoding with this field blanked.
    pub hash: BlockHash,

    /// The record itself.
    pub body: Payload,
}

impl Block {
    /// Build a block and compute its hash.
    pub fn seal(
        height: u64,
        timestamp: i64,
        previous_hash: Option<BlockHash>,
        body: Payload,
    ) -> Self {
        let mut block = Self {
            height,
            timestamp,
            previous_hash,
            hash: BlockHash::from_bytes([0u8; 32]),
            body,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Recompute the hash from the block's content.
    ///
    /// The stored `hash` field never influences the result.
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash(Sha256Hash::hash(&canonical_bytes(self)).0)
    }

    /// Whether this is the height-0 block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// The owner recorded in the body, if any.
    pub fn owner(&self) -> Option<&str> {
        self.body.owner.as_deref()
    }

    /// Encode for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
