//! Hashing primitives and node identity

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Number of random bytes behind a node identifier (32 hex characters).
const NODE_IDENTIFIER_BYTES: usize = 16;

/// Raw SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 of `data` as a lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Returns true if `s` looks like the output of [`sha256_hex`].
pub fn is_digest_hex(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Generates the opaque per-process token that receives mining rewards.
/// Not persisted and not part of chain validity.
pub fn generate_node_identifier() -> String {
    let mut bytes = [0u8; NODE_IDENTIFIER_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
