//! # Inbound Port - DurableLog
//!
//! Narrow, dyn-safe surface a client (chain-client's batching pipeline)
//! depends on. Keeping it byte-oriented lets `ChainClientService` hold a
//! plain `Arc<dyn DurableLog>` instead of threading a second generic
//! parameter through for the backend, while `DurableStream<B>` itself
//! stays generic over `B` internally.

use crate::domain::DurableStreamError;

pub trait DurableLog: Send + Sync {
    /// Durably record `payload` and return the id it was assigned.
    fn append(&self, payload: Vec<u8>) -> Result<u64, DurableStreamError>;

    /// Forget an entry once its effect has been confirmed elsewhere (a
    /// batch flushed to chain and acknowledged).
    fn ack(&self, id: u64) -> Result<(), DurableStreamError>;

    /// Every entry not yet acked, in the order it was appended. Called
    /// once at startup to repopulate in-memory state after a restart.
    fn replay(&self) -> Result<Vec<(u64, Vec<u8>)>, DurableStreamError>;
}
