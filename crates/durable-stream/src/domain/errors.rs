use thiserror::Error;

#[derive(Debug, Error)]
pub enum DurableStreamError {
    #[error("durable backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("failed to encode entry: {0}")]
    Encode(String),

    #[error("failed to decode entry {0}: {1}")]
    Decode(u64, String),
}
