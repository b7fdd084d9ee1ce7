//! # Node Crypto
//!
//! Hashing and signature primitives shared by every component: the
//! domain-separated MMR leaf/internal hashes the artifact store uses to
//! build proofs, payload commitment hashing, and Ed25519 signing/
//! verification used by the executor server's authz checks and the
//! chain client's message signing.

pub mod errors;
pub mod hashing;
pub mod signatures;

pub use errors::CryptoError;
pub use hashing::{hash_many, internal_hash, leaf_hash, payload_hash, to_hex, Hash};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
