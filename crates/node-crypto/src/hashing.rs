//! # Domain-Separated Hashing
//!
//! SHA-256 throughout, with single-byte domain tags distinguishing leaf
//! nodes, internal nodes, and payload commitments so the same `Hash` type
//! can never be reinterpreted across contexts.

use sha2::{Digest, Sha256};

/// 256-bit hash output.
pub type Hash = [u8; 32];

const LEAF_TAG: u8 = 0x00;
const INTERNAL_TAG: u8 = 0x01;

/// Hash a single PoC artifact leaf: `SHA256(0x00 || LE32(nonce) || vector)`.
pub fn leaf_hash(nonce: i32, vector: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_TAG]);
    hasher.update(nonce.to_le_bytes());
    hasher.update(vector);
    hasher.finalize().into()
}

/// Hash an internal MMR node from its two children: `SHA256(0x01 || left || right)`.
pub fn internal_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([INTERNAL_TAG]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Hash a serialized payload (prompt or response) for on-chain commitment.
pub fn payload_hash(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

/// Hash an arbitrary sequence of byte slices in order (used when a
/// response payload is assembled from prompt + logprobs + completion).
pub fn hash_many(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_hash_is_domain_separated_from_internal() {
        let vector = vec![1u8, 2, 3];
        let leaf = leaf_hash(7, &vector);
        let internal = internal_hash(&leaf, &leaf);
        assert_ne!(leaf, internal);
    }

    #[test]
    fn leaf_hash_is_deterministic() {
        let vector = vec![9u8; 16];
        assert_eq!(leaf_hash(42, &vector), leaf_hash(42, &vector));
    }

    #[test]
    fn different_nonce_changes_hash() {
        let vector = vec![9u8; 16];
        assert_ne!(leaf_hash(1, &vector), leaf_hash(2, &vector));
    }
}
