//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Invalid signature
    #[error("invalid signature")]
    InvalidSignature,

    /// Invalid input for cryptographic operation
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
