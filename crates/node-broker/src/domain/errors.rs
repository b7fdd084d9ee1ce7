use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("node {0} not found")]
    NotFound(String),

    #[error("no healthy node serves the requested model")]
    NoNodesAvailable,

    #[error("command canceled")]
    ContextCanceled,

    #[error("ml-worker transport error: {0}")]
    Transport(String),
}

impl From<BrokerError> for node_types::CoreError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Validation(reasons) => {
                node_types::CoreError::Validation(reasons.join("; "))
            }
            BrokerError::NotFound(id) => node_types::CoreError::NotFound(id),
            BrokerError::NoNodesAvailable => {
                node_types::CoreError::CapacityExceeded
            }
            BrokerError::ContextCanceled => node_types::CoreError::ContextCanceled,
            BrokerError::Transport(m) => node_types::CoreError::TransientRemote(m),
        }
    }
}
