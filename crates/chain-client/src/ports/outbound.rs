//! Driven port: the chain's RPC/gRPC surface, abstracted so the batching
//! pipeline can be tested against a mock.

use node_types::{ChainMessage, MessageKind};

use crate::domain::ChainClientError;

pub trait ChainRpc: Send + Sync {
    /// Submit a batch of same-kind messages as a single chain transaction.
    /// Returns an opaque reference (tx hash) used to poll for the ack.
    fn submit_batch(
        &self,
        kind: MessageKind,
        messages: &[ChainMessage],
    ) -> Result<String, ChainClientError>;

    /// Whether the chain has included the referenced transaction.
    fn is_acknowledged(&self, tx_ref: &str) -> Result<bool, ChainClientError>;
}
