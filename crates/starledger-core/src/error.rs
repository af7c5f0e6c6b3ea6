//! Error types for Starledger Core.

use thiserror::Error;

use crate::types::BlockHash;

/// Core errors that can occur while handling blocks and proofs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Integrity findings for a single block or a link between two blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {height} hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        height: u64,
        stored: BlockHash,
        computed: BlockHash,
    },

    #[error("block {height} hash {expected} does not match its successor's link {got:?}")]
    BrokenLink {
        height: u64,
        expected: BlockHash,
        got: Option<BlockHash>,
    },

    #[error("block stored at height {key} claims height {claimed}")]
    HeightMismatch { key: u64, claimed: u64 },

    #[error("block stored at height {key} cannot be decoded: {reason}")]
    Corrupt { key: u64, reason: String },
}

impl ValidationError {
    /// Height of the block the finding is attributed to.
    pub fn height(&self) -> u64 {
        match self {
            ValidationError::HashMismatch { height, .. } => *height,
            ValidationError::BrokenLink { height, .. } => *height,
            ValidationError::HeightMismatch { key, .. } => *key,
            ValidationError::Corrupt { key, .. } => *key,
        }
    }

    /// Attribute the finding to `height` instead.
    ///
    /// Used when a block sits under a key that disagrees with its own height
    /// field: findings then name where the block is stored.
    pub fn with_height(self, height: u64) -> Self {
        match self {
            ValidationError::HashMismatch {
                stored, computed, ..
            } => ValidationError::HashMismatch {
                height,
                stored,
                computed,
            },
            ValidationError::BrokenLink { expected, got, .. } => ValidationError::BrokenLink {
                height,
                expected,
                got,
            },
            ValidationError::HeightMismatch { claimed, .. } => {
                ValidationError::HeightMismatch { key: height, claimed }
            }
            ValidationError::Corrupt { reason, .. } => ValidationError::Corrupt {
                key: height,
                reason,
            },
        }
    }
}
