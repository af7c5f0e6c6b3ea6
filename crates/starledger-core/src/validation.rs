//! Block validation: hash recomputation and chain-link checks.

use crate::block::Block;
use crate::error::ValidationError;

/// Check that a block's stored hash matches its content.
pub fn validate_block_hash(block: &Block) -> Result<(), ValidationError> {
    let computed = block.compute_hash();
    if computed != block.hash {
        return Err(ValidationError::HashMismatch {
            height: block.height,
            stored: block.hash,
            computed,
        });
    }
    Ok(())
}

/// Check that `next` points at `prev`.
///
/// The finding is attributed to `prev`, the block its successor no longer
/// links to.
pub fn validate_link(prev: &Block, next: &Block) -> Result<(), ValidationError> {
    if next.previous_hash != Some(prev.hash) {
        return Err(ValidationError::BrokenLink {
            height: prev.height,
            expected: prev.hash,
            got: next.previous_hash,
        });
    }
    Ok(())
}
