//! Batching state for the five message kinds the dispatcher tracks
//! independently. Each kind accumulates pending messages and flushes on
//! either a size threshold or its per-kind block deadline, whichever
//! comes first.

use node_types::{ChainMessage, MessageKind};

/// A message still waiting to be batched, paired with the durable-stream
/// id(s) backing it. A `PocValidationV2` merge folds a second message
/// into an existing one without losing its id, so this is a `Vec` rather
/// than a single id.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub durable_ids: Vec<u64>,
    pub message: ChainMessage,
}

#[derive(Debug, Default)]
pub struct PendingBatch {
    pub kind: Option<MessageKind>,
    pub messages: Vec<QueuedMessage>,
    pub first_enqueued_at_height: Option<u64>,
}

impl PendingBatch {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, height: u64, durable_id: u64, message: ChainMessage) {
        self.push_queued(height, QueuedMessage { durable_ids: vec![durable_id], message });
    }

    /// Re-admit an already-id-tagged message, used when a flush fails
    /// and its batch is re-queued, or when replaying the durable log at
    /// startup.
    pub fn push_queued(&mut self, height: u64, queued: QueuedMessage) {
        if self.first_enqueued_at_height.is_none() {
            self.first_enqueued_at_height = Some(height);
        }
        self.kind.get_or_insert(queued.message.kind);
        self.messages.push(queued);
    }

    pub fn take(&mut self) -> Vec<QueuedMessage> {
        self.first_enqueued_at_height = None;
        std::mem::take(&mut self.messages)
    }

    pub fn is_overdue(&self, current_height: u64, deadline_blocks: u64) -> bool {
        match self.first_enqueued_at_height {
            Some(first) => current_height.saturating_sub(first) >= deadline_blocks,
            None => false,
        }
    }
}

/// A batch that has been submitted to the chain but not yet confirmed.
/// `durable_ids` carries every queued message's durable-stream id so the
/// whole batch can be acked together once the chain confirms it.
#[derive(Debug, Clone)]
pub struct InFlightBatch {
    pub tx_ref: String,
    pub kind: MessageKind,
    pub message_count: usize,
    pub submitted_at_height: u64,
    pub durable_ids: Vec<u64>,
}

/// What gets serialized into the durable log for each queued message:
/// enough to re-admit it into the right batch after a restart.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DurableEnvelope {
    pub height: u64,
    pub message: ChainMessage,
}
