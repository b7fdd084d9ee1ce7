//! Freshness and signature checks shared by the payload and proof
//! endpoints: both bind a base64 Ed25519 signature over a
//! caller-constructed message plus a nanosecond timestamp.

use node_crypto::{Ed25519PublicKey, Ed25519Signature};

use crate::domain::errors::ExecutorError;

const MAX_CLOCK_SKEW_FUTURE_NANOS: i128 = 10_000_000_000; // 10s
const MAX_AGE_NANOS: i128 = 60_000_000_000; // 60s

pub fn validate_timestamp(timestamp_ns: u128, now_ns: u128) -> Result<(), ExecutorError> {
    let diff = now_ns as i128 - timestamp_ns as i128;
    if diff > MAX_AGE_NANOS {
        return Err(ExecutorError::BadRequest("timestamp too old".to_string()));
    }
    if diff < -MAX_CLOCK_SKEW_FUTURE_NANOS {
        return Err(ExecutorError::BadRequest("timestamp in future".to_string()));
    }
    Ok(())
}

/// Verify `signature_b64` against `message` using any key in `candidates`.
pub fn verify_any(
    candidates: &[Ed25519PublicKey],
    message: &[u8],
    signature_b64: &str,
) -> Result<(), ExecutorError> {
    let sig_bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, signature_b64)
        .map_err(|_| ExecutorError::BadRequest("malformed signature encoding".to_string()))?;
    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| ExecutorError::BadRequest("signature must be 64 bytes".to_string()))?;
    let signature = Ed25519Signature::from_bytes(sig_array);

    if candidates
        .iter()
        .any(|pk| pk.verify(message, &signature).is_ok())
    {
        Ok(())
    } else {
        Err(ExecutorError::Unauthorized(
            "signature does not match any allowed key".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_timestamp_within_window() {
        assert!(validate_timestamp(1_000_000_000_000, 1_000_000_000_000 + 5_000_000_000).is_ok());
    }

    #[test]
    fn rejects_timestamp_older_than_sixty_seconds() {
        let now = 1_000_000_000_000u128;
        assert!(validate_timestamp(now - 90_000_000_000, now).is_err());
    }

    #[test]
    fn rejects_timestamp_too_far_in_future() {
        let now = 1_000_000_000_000u128;
        assert!(validate_timestamp(now + 15_000_000_000, now).is_err());
    }

    #[test]
    fn verify_any_accepts_matching_key_among_several() {
        let kp1 = node_crypto::Ed25519KeyPair::generate();
        let kp2 = node_crypto::Ed25519KeyPair::generate();
        let sig = kp2.sign(b"hello");
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, sig.as_bytes());
        let result = verify_any(&[kp1.public_key(), kp2.public_key()], b"hello", &encoded);
        assert!(result.is_ok());
    }

    #[test]
    fn verify_any_rejects_when_no_key_matches() {
        let kp1 = node_crypto::Ed25519KeyPair::generate();
        let other = node_crypto::Ed25519KeyPair::generate();
        let sig = other.sign(b"hello");
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, sig.as_bytes());
        let result = verify_any(&[kp1.public_key()], b"hello", &encoded);
        assert!(result.is_err());
    }
}
