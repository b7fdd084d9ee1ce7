use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainClientError {
    #[error("chain rpc submit failed: {0}")]
    SubmitFailed(String),

    #[error("batch {0} was never acknowledged within its ack window")]
    AckTimeout(String),

    #[error("chain rpc unreachable: {0}")]
    Unreachable(String),

    #[error("durable log unavailable: {0}")]
    DurableLog(String),
}

impl From<ChainClientError> for node_types::CoreError {
    fn from(err: ChainClientError) -> Self {
        match err {
            ChainClientError::SubmitFailed(m) => node_types::CoreError::TransientRemote(m),
            ChainClientError::AckTimeout(m) => node_types::CoreError::TransientRemote(m),
            ChainClientError::Unreachable(m) => node_types::CoreError::TransientRemote(m),
            ChainClientError::DurableLog(m) => node_types::CoreError::TransientRemote(m),
        }
    }
}

impl From<durable_stream::DurableStreamError> for ChainClientError {
    fn from(err: durable_stream::DurableStreamError) -> Self {
        ChainClientError::DurableLog(err.to_string())
    }
}
