//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding and the SHA-256 block hash, so a
//! change to either shows up as a failed vector rather than a silently
//! forked chain.

use starledger_core::{Block, BlockHash, Payload};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub height: u64,
    /// Seconds since the epoch.
    pub timestamp: i64,
    /// Raw predecessor hash, `None` for genesis.
    pub previous_hash: Option<[u8; 32]>,
    pub owner: Option<&'static str>,
    pub data: &'static [u8],
    /// Expected block hash (hex).
    pub expected_hash: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Genesis block",
            height: 0,
            timestamp: 1_700_000_000,
            previous_hash: None,
            owner: None,
            data: b"Genesis block",
            expected_hash: "dc350682a6615d4354afb29d02cdd7fd57013626bfc4ad96475a21b42f4cfb79",
        },
        GoldenVector {
            name: "Owned block with hello payload",
            height: 1,
            timestamp: 1_700_000_060,
            previous_hash: Some([0x11; 32]),
            owner: Some("alice"),
            data: b"hello",
            expected_hash: "415231e2897f755a6ace1708111e112cc78a53fa423c1ec773368bd99575244e",
        },
        GoldenVector {
            name: "Empty owner and data",
            height: 42,
            timestamp: 0,
            previous_hash: Some([0xaa; 32]),
            owner: Some(""),
            data: b"",
            expected_hash: "2a7c36f0dcee682b6a5bc6cca953abf0cde4f1593639acd759b2bc395b2a2e08",
        },
    ]
}

/// Seal the block a vector describes.
pub fn block_from_vector(vector: &GoldenVector) -> Block {
    let body = match vector.owner {
        Some(owner) => Payload::owned(owner, vector.data.to_vec()),
        None => Payload::unowned(vector.data.to_vec()),
    };
    Block::seal(
        vector.height,
        vector.timestamp,
        vector.previous_hash.map(BlockHash::from_bytes),
        body,
    )
}

/// Check every vector, returning `(name, matches, computed_hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let hex = block_from_vector(v).hash.to_hex();
            let matches = hex == v.expected_hash;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use starledger_core::canonical_bytes;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector '{}' hashed to {}", name, hex);
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let b1 = block_from_vector(&vector);
            let b2 = block_from_vector(&vector);

            assert_eq!(b1.hash, b2.hash, "vector '{}'", vector.name);
            assert_eq!(canonical_bytes(&b1), canonical_bytes(&b2));
        }
    }

    #[test]
    fn test_null_owner_differs_from_empty_owner() {
        let mut with_empty = all_vectors().remove(0);
        with_empty.owner = Some("");
        let genesis = block_from_vector(&all_vectors()[0]);

        assert_ne!(block_from_vector(&with_empty).hash, genesis.hash);
    }
}
