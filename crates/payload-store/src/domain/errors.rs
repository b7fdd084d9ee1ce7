use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadStoreError {
    #[error("payload not found for {0:?}")]
    NotFound(node_types::PayloadKey),

    #[error("durable backend unavailable: {0}")]
    DurableUnavailable(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("corrupt record for {0:?}: {1}")]
    Corrupt(node_types::PayloadKey, String),
}

impl From<PayloadStoreError> for node_types::CoreError {
    fn from(err: PayloadStoreError) -> Self {
        match err {
            PayloadStoreError::NotFound(k) => {
                node_types::CoreError::PayloadUnavailable(k.inference_id)
            }
            PayloadStoreError::DurableUnavailable(m) => node_types::CoreError::TransientRemote(m),
            PayloadStoreError::Io(m) => node_types::CoreError::TransientRemote(m),
            PayloadStoreError::Corrupt(k, m) => {
                node_types::CoreError::Fatal(format!("{}: {m}", k.inference_id))
            }
        }
    }
}
