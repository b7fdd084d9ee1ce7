use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ValidatorError {
    #[error("epoch stale for inference {0}")]
    EpochStale(String),

    #[error("payload hash mismatch for inference {0}")]
    HashMismatch(String),

    #[error("payload unavailable for inference {0}")]
    PayloadUnavailable(String),

    #[error("no healthy worker available for model {0}")]
    NoNodesAvailable(String),

    #[error("transient remote error: {0}")]
    TransientRemote(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<node_types::CoreError> for ValidatorError {
    fn from(err: node_types::CoreError) -> Self {
        match err {
            node_types::CoreError::NotFound(m) => ValidatorError::NotFound(m),
            node_types::CoreError::Validation(m) => ValidatorError::Validation(m),
            node_types::CoreError::TransientRemote(m) => ValidatorError::TransientRemote(m),
            node_types::CoreError::HashMismatch(id) => ValidatorError::HashMismatch(id),
            node_types::CoreError::EpochStale(id) => ValidatorError::EpochStale(id),
            node_types::CoreError::PayloadUnavailable(id) => ValidatorError::PayloadUnavailable(id),
            other => ValidatorError::TransientRemote(other.to_string()),
        }
    }
}

impl From<node_broker::BrokerError> for ValidatorError {
    fn from(err: node_broker::BrokerError) -> Self {
        match err {
            node_broker::BrokerError::NoNodesAvailable => {
                ValidatorError::NoNodesAvailable("no matching healthy worker".to_string())
            }
            node_broker::BrokerError::NotFound(m) => ValidatorError::NotFound(m),
            node_broker::BrokerError::Validation(errs) => ValidatorError::Validation(errs.join("; ")),
            other => ValidatorError::TransientRemote(other.to_string()),
        }
    }
}
