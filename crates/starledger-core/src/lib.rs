//! # Starledger Core
//!
//! Pure primitives for Starledger: blocks, hash chaining, canonical encoding
//! and the address-proof message scheme.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over the ledger's data structures.
//!
//! ## Key Types
//!
//! - [`Block`] - One immutable, hash-linked ledger record
//! - [`BlockHash`] - SHA-256 content hash of a block
//! - [`Payload`] - The opaque body a block carries
//! - [`Address`] - A claimant identity (hex Ed25519 public key)
//! - [`StarRegistration`] - Schema-checked star payload for the registry
//!
//! ## Canonicalization
//!
//! Block hashes are computed over deterministic CBOR. See [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod challenge;
pub mod crypto;
pub mod error;
pub mod star;
pub mod types;
pub mod validation;

pub use block::{Block, Payload};
pub use canonical::canonical_bytes;
pub use challenge::{challenge_message, sign_message, signed_message, verify_message};
pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair, Sha256Hash};
pub use error::{CoreError, ValidationError};
pub use star::{Star, StarRecord, StarRegistration, MAX_STORY_BYTES};
pub use types::{Address, BlockHash};
pub use validation::{validate_block_hash, validate_link};
