//! Canonical CBOR encoding for deterministic block hashing.
//!
//! This module implements the RFC 8949 Core Deterministic Encoding subset the
//! ledger needs:
//! - Map keys are small unsigned integers written in ascending order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 seconds)
//!
//! The canonical encoding is the load-bearing piece of the ledger: the same
//! block must produce identical bytes (and thus identical hashes) on every
//! platform and across releases.

use crate::block::{Block, Payload};

/// Block field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const HEIGHT: u64 = 0;
    pub const TIMESTAMP: u64 = 1;
    pub const PREVIOUS_HASH: u64 = 2;
    pub const BODY: u64 = 3;
    pub const HASH: u64 = 4;

    pub const BODY_OWNER: u64 = 0;
    pub const BODY_DATA: u64 = 1;
}

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_MAP: u8 = 5;
const SIMPLE_NULL: u8 = 0xf6;

/// Encode a block to the canonical bytes its hash is computed over.
///
/// The `hash` field is written as an empty byte string regardless of its
/// value, so the encoding is identical before and after sealing.
pub fn canonical_bytes(block: &Block) -> Vec<u8> {
    let mut buf = Vec::with_capacity(96 + block.body.data.len());

    encode_uint(&mut buf, MAJOR_MAP, 5);

    // 0: height
    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::HEIGHT);
    encode_uint(&mut buf, MAJOR_UNSIGNED, block.height);

    // 1: timestamp
    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::TIMESTAMP);
    encode_int(&mut buf, block.timestamp);

    // 2: previous_hash (null for genesis)
    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::PREVIOUS_HASH);
    match &block.previous_hash {
        Some(hash) => encode_bytes(&mut buf, hash.as_bytes()),
        None => buf.push(SIMPLE_NULL),
    }

    // 3: body
    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::BODY);
    encode_payload(&mut buf, &block.body);

    // 4: hash, blanked
    encode_uint(&mut buf, MAJOR_UNSIGNED, keys::HASH);
    encode_bytes(&mut buf, &[]);

    buf
}

fn encode_payload(buf: &mut Vec<u8>, payload: &Payload) {
    encode_uint(buf, MAJOR_MAP, 2);

    encode_uint(buf, MAJOR_UNSIGNED, keys::BODY_OWNER);
    match &payload.owner {
        Some(owner) => encode_text(buf, owner),
        None => buf.push(SIMPLE_NULL),
    }

    encode_uint(buf, MAJOR_UNSIGNED, keys::BODY_DATA);
    encode_bytes(buf, &payload.data);
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, MAJOR_UNSIGNED, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, MAJOR_NEGATIVE, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, MAJOR_BYTES, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, MAJOR_TEXT, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}
