//! # Inbound Port - MessageClient
//!
//! The primary API other components use to get a message onto the chain
//! without each of them implementing their own batching/retry policy.

use node_types::{ChainMessage, CoreError};

pub trait MessageClient: Send + Sync {
    /// Queue a message for the next flush of its kind's batch.
    fn enqueue(&self, current_height: u64, message: ChainMessage) -> Result<(), CoreError>;

    /// Drive the batching pipeline forward one block: flush any batch that
    /// is full or overdue, and re-check in-flight batches against the ack
    /// window.
    fn tick(&self, current_height: u64);
}
