//! Block fingerprinting.
//!
//! The fingerprint is Blake3 over a domain-separated encoding of the four
//! content fields. Variable-length fields are length-prefixed so that
//! `("ab", "c")` and `("a", "bc")` never collide.

/// Domain separator for block fingerprints.
pub const FINGERPRINT_DOMAIN: &[u8] = b"chainlet-block-v0:";

/// Compute the content fingerprint of a block as lowercase hex.
///
/// Deterministic over `(index, previous_hash, timestamp, data)`.
pub fn fingerprint(index: u64, previous_hash: &str, timestamp: i64, data: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(FINGERPRINT_DOMAIN);
    hasher.update(&index.to_be_bytes());
    hasher.update(&(previous_hash.len() as u64).to_be_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(&timestamp.to_be_bytes());
    hasher.update(&(data.len() as u64).to_be_bytes());
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}
