//! Leaf error type for the artifact store, converted to `node_types::CoreError`
//! at the port boundary.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ArtifactStoreError {
    #[error("duplicate nonce {0} already present in this stage's log")]
    DuplicateNonce(i32),

    #[error("stage {0} capacity exceeded")]
    CapacityExceeded(u64),

    #[error("no artifact log open for stage {0}")]
    StageNotFound(u64),

    #[error("log file corrupt at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("i/o error: {0}")]
    Io(String),

    #[error("leaf index {0} out of range")]
    LeafOutOfRange(u64),
}

impl From<ArtifactStoreError> for node_types::CoreError {
    fn from(err: ArtifactStoreError) -> Self {
        match err {
            ArtifactStoreError::DuplicateNonce(n) => node_types::CoreError::DuplicateNonce(n),
            ArtifactStoreError::CapacityExceeded(_) => node_types::CoreError::CapacityExceeded,
            ArtifactStoreError::StageNotFound(s) => {
                node_types::CoreError::NotFound(format!("poc stage {s}"))
            }
            ArtifactStoreError::Corrupt { offset, reason } => {
                node_types::CoreError::Fatal(format!("corrupt log at {offset}: {reason}"))
            }
            ArtifactStoreError::Io(msg) => node_types::CoreError::TransientRemote(msg),
            ArtifactStoreError::LeafOutOfRange(i) => {
                node_types::CoreError::NotFound(format!("leaf {i}"))
            }
        }
    }
}
