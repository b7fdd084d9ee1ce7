//! # Core Error Taxonomy
//!
//! The cross-cutting error kinds from the node's error-handling design:
//! each component additionally defines its own leaf errors via `thiserror`,
//! converting into `CoreError` at its port boundary so callers can apply a
//! single retry/propagation policy.

use thiserror::Error;

/// Cross-cutting error kinds shared by every component.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Input failed a basic predicate; never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A store lookup missed.
    #[error("not found: {0}")]
    NotFound(String),

    /// A PoC artifact with an existing nonce arrived at the same stage.
    #[error("duplicate nonce {0} in stage")]
    DuplicateNonce(i32),

    /// The artifact store is at its hard leaf cap.
    #[error("artifact store capacity exceeded")]
    CapacityExceeded,

    /// A remote call (ML worker, peer executor, chain RPC) failed or timed out.
    #[error("transient remote error: {0}")]
    TransientRemote(String),

    /// Executor-served payload did not match the on-chain commitment.
    #[error("payload hash mismatch for inference {0}")]
    HashMismatch(String),

    /// The inference is old enough that validating it is no longer useful.
    #[error("epoch stale for inference {0}")]
    EpochStale(String),

    /// Payload could not be retrieved after the full retry budget.
    #[error("payload unavailable for inference {0}")]
    PayloadUnavailable(String),

    /// Signature verification against the authz cache failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Process shutdown is in progress; propagate up to quiesce tasks.
    #[error("context canceled")]
    ContextCanceled,

    /// Cannot continue; only raised at startup.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::TransientRemote(_))
    }
}
