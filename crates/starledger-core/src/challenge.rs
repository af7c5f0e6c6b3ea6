//! Challenge messages and the signature scheme that answers them.
//!
//! A claimant proves control of an address by signing the challenge message
//! issued for it. The signed bytes are the message behind a fixed prefix so a
//! challenge signature can never double as a signature over anything else.

use crate::crypto::{Ed25519Signature, Keypair};
use crate::types::Address;

/// Prefix prepended to every challenge message before signing.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"Starledger Signed Message:\n";

/// Build the challenge message for `address`.
///
/// The message is fully determined by its inputs, so it can be recomputed
/// and checked against a stored record.
pub fn challenge_message(address: &Address, issued_at_millis: i64, domain_tag: &str) -> String {
    format!("{}:{}:{}", address, issued_at_millis, domain_tag)
}

/// The bytes a signer actually signs for `message`.
pub fn signed_message(message: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + message.len());
    buf.extend_from_slice(SIGNED_MESSAGE_PREFIX);
    buf.extend_from_slice(message.as_bytes());
    buf
}

/// Sign a challenge message, returning the hex signature a claimant submits.
pub fn sign_message(keypair: &Keypair, message: &str) -> String {
    keypair.sign(&signed_message(message)).to_hex()
}

/// Check a hex signature over `message` against the key behind `address`.
///
/// Malformed addresses and signatures are verification failures, not errors.
pub fn verify_message(address: &Address, message: &str, signature: &str) -> bool {
    let Ok(public_key) = address.public_key() else {
        return false;
    };
    let Ok(signature) = Ed25519Signature::from_hex(signature.trim()) else {
        return false;
    };
    public_key
        .verify(&signed_message(message), &signature)
        .is_ok()
}
