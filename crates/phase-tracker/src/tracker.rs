use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use block_events::BlockEvent;
use node_types::ConfirmationPocEvent;

use crate::snapshot::PhaseSnapshot;

pub struct PhaseTracker {
    state: RwLock<PhaseSnapshot>,
}

impl PhaseTracker {
    pub fn new(initial: PhaseSnapshot) -> Arc<Self> {
        Arc::new(Self { state: RwLock::new(initial) })
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        self.state.read().clone()
    }

    /// Apply a new block: recompute phase and clear any confirmation event
    /// whose window has closed.
    pub fn on_block(&self, event: &BlockEvent) {
        let mut state = self.state.write();
        state.block_height = event.height;
        state.epoch = event.epoch;
        state.phase = event.epoch.current_phase(event.height);
        if let Some(ce) = &state.confirmation_event {
            if event.height > ce.batch_window_end {
                state.confirmation_event = None;
            }
        }
    }

    pub fn start_confirmation_event(&self, event: ConfirmationPocEvent) {
        self.state.write().confirmation_event = Some(event);
    }

    pub fn set_pocv2_enabled(&self, enabled: bool) {
        self.state.write().pocv2_enabled = enabled;
    }

    pub fn set_confirmation_pocv2_enabled(&self, enabled: bool) {
        self.state.write().confirmation_pocv2_enabled = enabled;
    }

    /// Drive the cache from a block-event subscription until the channel
    /// closes (on shutdown) or lags past its buffer.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<BlockEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.on_block(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "phase tracker missed block events, resuming from latest");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_types::Epoch;

    fn epoch(poc_start: u64) -> Epoch {
        Epoch {
            epoch_index: 0,
            start_block_height: 0,
            poc_start_block_height: poc_start,
            epoch_length: 1000,
            poc_stage_duration: 50,
            wind_down_blocks: 10,
        }
    }

    #[test]
    fn on_block_updates_phase() {
        let tracker = PhaseTracker::new(PhaseSnapshot::genesis(epoch(100)));
        tracker.on_block(&BlockEvent { height: 100, epoch: epoch(100) });
        assert_eq!(tracker.snapshot().phase, node_types::Phase::PoCGenerate);
    }

    #[test]
    fn confirmation_event_clears_after_window() {
        let tracker = PhaseTracker::new(PhaseSnapshot::genesis(epoch(1000)));
        tracker.start_confirmation_event(ConfirmationPocEvent {
            trigger_height: 500,
            phase: node_types::ConfirmationPhase::Generation,
            batch_window_start: 500,
            batch_window_end: 520,
        });
        tracker.on_block(&BlockEvent { height: 510, epoch: epoch(1000) });
        assert!(tracker.snapshot().confirmation_event.is_some());
        tracker.on_block(&BlockEvent { height: 521, epoch: epoch(1000) });
        assert!(tracker.snapshot().confirmation_event.is_none());
    }
}
