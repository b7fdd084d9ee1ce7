//! `ChainClientService`: five independent per-kind batches, each flushed
//! on a 1-block tick when full-enough or past its deadline, with
//! submitted batches tracked until the chain acknowledges them or the
//! ack window expires and they're retried.
//!
//! Every message is durably appended before it is admitted to a batch,
//! and acked only once its batch is confirmed on-chain (or given up on
//! after the ack window lapses), so a process restart replays whatever
//! was still pending or in flight instead of losing it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use durable_stream::DurableLog;
use node_types::{ChainMessage, CoreError, MessageKind, TxDeadlineTable};

use crate::domain::{ChainClientError, DurableEnvelope, InFlightBatch, PendingBatch, QueuedMessage};
use crate::ports::inbound::MessageClient;
use crate::ports::outbound::ChainRpc;

/// A batch flushes early once it holds this many messages, regardless of
/// how many blocks remain before its deadline.
const MAX_BATCH_SIZE: usize = 256;

pub struct ChainClientService<R> {
    rpc: Arc<R>,
    durable: Arc<dyn DurableLog>,
    deadlines: TxDeadlineTable,
    ack_window_blocks: u64,
    pending: Mutex<HashMap<MessageKind, PendingBatch>>,
    in_flight: Mutex<Vec<InFlightBatch>>,
}

impl<R: ChainRpc> ChainClientService<R> {
    /// Build a service with nothing durably queued yet. Fine for tests;
    /// a real deployment should use [`Self::open`] so a restart doesn't
    /// silently drop whatever was mid-flight.
    pub fn new(rpc: Arc<R>, deadlines: TxDeadlineTable, ack_window: Duration) -> Self {
        let backend = durable_stream::adapters::InMemoryDurableLog::new();
        let durable = durable_stream::DurableStream::open(backend)
            .expect("in-memory backend never fails to open");
        Self::with_durable(rpc, Arc::new(durable), deadlines, ack_window)
    }

    /// Build a service backed by `durable`, replaying any entries still
    /// present (meaning: appended but never acked) back into their
    /// kind's pending batch.
    pub fn open(
        rpc: Arc<R>,
        durable: Arc<dyn DurableLog>,
        deadlines: TxDeadlineTable,
        ack_window: Duration,
    ) -> Result<Self, ChainClientError> {
        let service = Self::with_durable(rpc, durable, deadlines, ack_window);
        service.replay_durable()?;
        Ok(service)
    }

    fn with_durable(
        rpc: Arc<R>,
        durable: Arc<dyn DurableLog>,
        deadlines: TxDeadlineTable,
        ack_window: Duration,
    ) -> Self {
        let mut pending = HashMap::new();
        for kind in MessageKind::ALL {
            pending.insert(kind, PendingBatch::default());
        }
        Self {
            rpc,
            durable,
            deadlines,
            // Approximated as one block per ack_window second; the chain
            // client only needs a coarse bound on in-flight staleness.
            ack_window_blocks: ack_window.as_secs().max(1),
            pending: Mutex::new(pending),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    fn replay_durable(&self) -> Result<(), ChainClientError> {
        let entries = self.durable.replay().map_err(ChainClientError::from)?;
        let mut pending = self.pending.lock();
        for (id, bytes) in entries {
            let envelope: DurableEnvelope = match durable_stream::decode(id, &bytes) {
                Ok(envelope) => envelope,
                Err(err) => {
                    tracing::warn!(id, %err, "dropping unreadable durable-stream entry");
                    continue;
                }
            };
            let batch = pending
                .get_mut(&envelope.message.kind)
                .expect("all kinds pre-registered");
            batch.push_queued(
                envelope.height,
                QueuedMessage { durable_ids: vec![id], message: envelope.message },
            );
        }
        Ok(())
    }

    fn flush_kind(&self, kind: MessageKind, current_height: u64) {
        let queued = {
            let mut pending = self.pending.lock();
            let batch = pending.get_mut(&kind).expect("all kinds pre-registered");
            if batch.is_empty() {
                return;
            }
            batch.take()
        };
        let messages: Vec<ChainMessage> = queued.iter().map(|q| q.message.clone()).collect();
        match self.rpc.submit_batch(kind, &messages) {
            Ok(tx_ref) => {
                self.in_flight.lock().push(InFlightBatch {
                    tx_ref,
                    kind,
                    message_count: queued.len(),
                    submitted_at_height: current_height,
                    durable_ids: queued.iter().flat_map(|q| q.durable_ids.iter().copied()).collect(),
                });
            }
            Err(err) => {
                tracing::warn!(?kind, %err, "batch submission failed, re-queueing");
                let mut pending = self.pending.lock();
                let batch = pending.get_mut(&kind).expect("all kinds pre-registered");
                for q in queued {
                    batch.push_queued(current_height, q);
                }
            }
        }
    }

    fn ack_durable(&self, ids: &[u64]) {
        for id in ids {
            if let Err(err) = self.durable.ack(*id) {
                tracing::warn!(id = *id, %err, "durable-stream ack failed, entry will be re-replayed on restart");
            }
        }
    }

    fn reap_in_flight(&self, current_height: u64) {
        let mut still_in_flight = Vec::new();
        let entries = std::mem::take(&mut *self.in_flight.lock());
        for entry in entries {
            match self.rpc.is_acknowledged(&entry.tx_ref) {
                Ok(true) => {
                    self.ack_durable(&entry.durable_ids);
                }
                Ok(false) => {
                    if current_height.saturating_sub(entry.submitted_at_height)
                        >= self.ack_window_blocks
                    {
                        tracing::warn!(tx_ref = %entry.tx_ref, "ack window expired, batch considered lost");
                        self.ack_durable(&entry.durable_ids);
                    } else {
                        still_in_flight.push(entry);
                    }
                }
                Err(err) => {
                    tracing::warn!(tx_ref = %entry.tx_ref, %err, "ack check failed, retrying next tick");
                    still_in_flight.push(entry);
                }
            }
        }
        *self.in_flight.lock() = still_in_flight;
    }
}

impl<R: ChainRpc> MessageClient for ChainClientService<R> {
    fn enqueue(&self, current_height: u64, message: ChainMessage) -> Result<(), CoreError> {
        let envelope = DurableEnvelope { height: current_height, message: message.clone() };
        let bytes = durable_stream::encode(&envelope).map_err(ChainClientError::from)?;
        let durable_id = self.durable.append(bytes).map_err(ChainClientError::from)?;

        let mut pending = self.pending.lock();
        let batch = pending
            .get_mut(&message.kind)
            .expect("all kinds pre-registered");

        if message.kind == MessageKind::PocValidationV2 && message.merge_key != 0 {
            if let Some(existing) = batch
                .messages
                .iter_mut()
                .find(|q| q.message.merge_key == message.merge_key)
            {
                merge_validation_payload(&mut existing.message, &message);
                existing.durable_ids.push(durable_id);
                return Ok(());
            }
        }
        batch.push(current_height, durable_id, message);
        Ok(())
    }

    fn tick(&self, current_height: u64) {
        self.reap_in_flight(current_height);
        for kind in MessageKind::ALL {
            let should_flush = {
                let mut pending = self.pending.lock();
                let batch = pending.get_mut(&kind).expect("all kinds pre-registered");
                !batch.is_empty()
                    && (batch.messages.len() >= MAX_BATCH_SIZE
                        || batch.is_overdue(current_height, self.deadlines.deadline_blocks(kind)))
            };
            if should_flush {
                self.flush_kind(kind, current_height);
            }
        }
    }
}

/// Merge a newly-arrived validation message into the pending one sharing
/// its height key, concatenating their payload arrays.
fn merge_validation_payload(existing: &mut ChainMessage, incoming: &ChainMessage) {
    if let (Some(existing_arr), Some(incoming_arr)) = (
        existing.payload.as_array_mut(),
        incoming.payload.as_array(),
    ) {
        existing_arr.extend(incoming_arr.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockChainRpc;
    use durable_stream::adapters::InMemoryDurableLog;
    use durable_stream::DurableStream;
    use serde_json::json;

    fn client() -> ChainClientService<MockChainRpc> {
        ChainClientService::new(
            Arc::new(MockChainRpc::new()),
            TxDeadlineTable::default(),
            Duration::from_secs(60),
        )
    }

    fn msg(kind: MessageKind, merge_key: u64) -> ChainMessage {
        ChainMessage { kind, merge_key, payload: json!([1]) }
    }

    #[test]
    fn tick_flushes_once_deadline_elapses() {
        let client = client();
        client.enqueue(100, msg(MessageKind::StartInference, 0)).unwrap();
        client.tick(100);
        // not yet due
        client.tick(249);
        // now past the 150-block default deadline for StartInference
        client.tick(250);
        // nothing left pending for this kind after flush
        let pending = client.pending.lock();
        assert!(pending.get(&MessageKind::StartInference).unwrap().is_empty());
    }

    #[test]
    fn poc_validations_v2_merge_by_height() {
        let client = client();
        client
            .enqueue(10, msg(MessageKind::PocValidationV2, 500))
            .unwrap();
        client
            .enqueue(10, msg(MessageKind::PocValidationV2, 500))
            .unwrap();
        let pending = client.pending.lock();
        let batch = pending.get(&MessageKind::PocValidationV2).unwrap();
        assert_eq!(batch.messages.len(), 1);
        assert_eq!(batch.messages[0].message.payload.as_array().unwrap().len(), 2);
        assert_eq!(batch.messages[0].durable_ids.len(), 2);
    }

    #[test]
    fn a_restart_replays_unacked_messages_back_into_pending() {
        let backend = InMemoryDurableLog::new();
        let durable: Arc<dyn DurableLog> = Arc::new(DurableStream::open(backend).unwrap());

        let before = ChainClientService::open(
            Arc::new(MockChainRpc::new()),
            durable.clone(),
            TxDeadlineTable::default(),
            Duration::from_secs(60),
        )
        .unwrap();
        before.enqueue(10, msg(MessageKind::StartInference, 0)).unwrap();

        // a fresh service opened over the same durable log, simulating a
        // restart before the message was ever flushed
        let after = ChainClientService::open(
            Arc::new(MockChainRpc::new()),
            durable,
            TxDeadlineTable::default(),
            Duration::from_secs(60),
        )
        .unwrap();
        let pending = after.pending.lock();
        assert!(!pending.get(&MessageKind::StartInference).unwrap().is_empty());
    }

    #[test]
    fn acknowledged_batches_are_removed_from_the_durable_log() {
        let backend = InMemoryDurableLog::new();
        let durable: Arc<dyn DurableLog> = Arc::new(DurableStream::open(backend).unwrap());
        let rpc = Arc::new(MockChainRpc::new());

        let client = ChainClientService::open(
            rpc.clone(),
            durable.clone(),
            TxDeadlineTable::default(),
            Duration::from_secs(60),
        )
        .unwrap();
        client.enqueue(10, msg(MessageKind::StartInference, 0)).unwrap();
        client.tick(10);
        client.tick(160); // past StartInference's 150-block deadline, flushes

        let tx_ref = {
            let in_flight = client.in_flight.lock();
            in_flight[0].tx_ref.clone()
        };
        rpc.acknowledge(&tx_ref);
        client.tick(161);

        assert!(durable.replay().unwrap().is_empty());
    }
}
