//! Thin wrapper around `tokio::sync::broadcast` so publishers and
//! subscribers depend on a narrow trait instead of the channel type
//! directly, matching the rest of the workspace's port-style boundaries.

use tokio::sync::broadcast;

use crate::events::BlockEvent;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no subscribers currently attached")]
    NoSubscribers,
}

pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: BlockEvent);
}

pub struct BlockEventBus {
    sender: broadcast::Sender<BlockEvent>,
}

impl BlockEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BlockEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BlockEventBus {
    fn publish(&self, event: BlockEvent) {
        // Err just means no receivers are attached right now; that's a
        // normal state during startup/shutdown, not a failure to log.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_types::Epoch;

    fn epoch() -> Epoch {
        Epoch {
            epoch_index: 0,
            start_block_height: 0,
            poc_start_block_height: 0,
            epoch_length: 1000,
            poc_stage_duration: 50,
            wind_down_blocks: 10,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = BlockEventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(BlockEvent { height: 42, epoch: epoch() });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.height, 42);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_get_a_copy() {
        let bus = BlockEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        bus.publish(BlockEvent { height: 1, epoch: epoch() });
        assert_eq!(rx1.recv().await.unwrap().height, 1);
        assert_eq!(rx2.recv().await.unwrap().height, 1);
    }
}
