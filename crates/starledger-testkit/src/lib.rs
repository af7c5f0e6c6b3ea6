//! # Starledger Testkit
//!
//! Testing utilities for Starledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed blocks with their expected hashes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A proven-claimant setup on a manual clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use starledger_testkit::vectors::{all_vectors, block_from_vector};
//!
//! for vector in all_vectors() {
//!     let block = block_from_vector(&vector);
//!     assert_eq!(block.hash.to_hex(), vector.expected_hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use starledger_testkit::generators::{block_from_params, BlockParams};
//!
//! proptest! {
//!     #[test]
//!     fn block_hash_is_deterministic(params: BlockParams) {
//!         let b1 = block_from_params(&params);
//!         let b2 = block_from_params(&params);
//!         prop_assert_eq!(b1.hash, b2.hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use starledger_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed([7u8; 32]);
//! fixture.prove().await?;
//! let block = fixture.coordinator.submit(&fixture.address(), fixture.payload(b"hi")).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{claimants, TestFixture, START_MILLIS};
pub use generators::{block_from_params, BlockParams};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector};
