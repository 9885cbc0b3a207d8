//! # Hashing
//!
//! Keccak-256 helpers and the EIP-191 "personal message" framing.

use sha3::{Digest as _, Keccak256};

use super::entities::Digest;

/// Keccak-256 hash function.
pub fn keccak256(data: &[u8]) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Keccak-256 over several tightly packed inputs.
pub fn keccak256_concat(inputs: &[&[u8]]) -> Digest {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Frame a message with the Ethereum signed-message prefix.
///
/// Format: `"\x19Ethereum Signed Message:\n" + byte length + message`. This is
/// the exact byte sequence a `personal_sign` wallet hashes, and the sequence a
/// contract wallet is asked to validate for the personal variant.
pub fn eip191_prefixed(message: &[u8]) -> Vec<u8> {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut framed = Vec::with_capacity(prefix.len() + message.len());
    framed.extend_from_slice(prefix.as_bytes());
    framed.extend_from_slice(message);
    framed
}

/// Digest a `personal_sign` message: keccak-256 of the EIP-191 framing.
pub fn personal_message_digest(message: &[u8]) -> Digest {
    keccak256(&eip191_prefixed(message))
}
