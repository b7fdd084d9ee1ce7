//! `CommitWorker`: the tick loop that submits PoC stage store commits and,
//! once a stage's generation window closes, the per-node weight
//! distribution derived from it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use artifact_store::ports::inbound::ArtifactStorePort;
use chain_client::ports::inbound::MessageClient;
use node_types::{ChainMessage, MessageKind};
use phase_tracker::PhaseTracker;

use crate::domain::{
    current_stage_height, distribute_weights, should_accept_store_commit,
    should_have_distributed_weights,
};
use crate::ports::NodeDistributionSource;

pub struct CommitWorker<A, M, D> {
    phase_tracker: Arc<PhaseTracker>,
    artifact_store: Arc<A>,
    message_client: Arc<M>,
    distribution_source: Arc<D>,
    distribution_retry_interval: Duration,

    current_stage: Mutex<Option<u64>>,
    last_committed: Mutex<Option<(u64, [u8; 32])>>,
    last_distribution_attempt: Mutex<Option<Instant>>,
    distribution_published: AtomicU64,
}

impl<A, M, D> CommitWorker<A, M, D>
where
    A: ArtifactStorePort,
    M: MessageClient,
    D: NodeDistributionSource,
{
    pub fn new(
        phase_tracker: Arc<PhaseTracker>,
        artifact_store: Arc<A>,
        message_client: Arc<M>,
        distribution_source: Arc<D>,
        distribution_retry_interval: Duration,
    ) -> Self {
        Self {
            phase_tracker,
            artifact_store,
            message_client,
            distribution_source,
            distribution_retry_interval,
            current_stage: Mutex::new(None),
            last_committed: Mutex::new(None),
            last_distribution_attempt: Mutex::new(None),
            distribution_published: AtomicU64::new(0),
        }
    }

    pub fn tick(&self, current_height: u64) {
        let snapshot = self.phase_tracker.snapshot();
        if !snapshot.pocv2_enabled {
            return;
        }
        let stage = current_stage_height(&snapshot);

        {
            let mut current = self.current_stage.lock();
            if *current != Some(stage) {
                *current = Some(stage);
                *self.last_committed.lock() = None;
                *self.last_distribution_attempt.lock() = None;
                self.distribution_published.store(0, Ordering::Relaxed);
            }
        }

        if should_accept_store_commit(&snapshot.epoch, current_height, stage) {
            self.maybe_commit_store(stage, current_height);
        }

        if should_have_distributed_weights(&snapshot) && self.distribution_published.load(Ordering::Relaxed) == 0
        {
            self.maybe_distribute_weights(stage, current_height);
        }
    }

    fn maybe_commit_store(&self, stage: u64, current_height: u64) {
        let count = self.artifact_store.leaf_count(stage);
        if count == 0 {
            return;
        }
        let root = match self.artifact_store.root(stage) {
            Ok(r) => r,
            Err(_) => return,
        };
        if *self.last_committed.lock() == Some((count, root)) {
            return;
        }
        let payload = serde_json::json!({
            "type": "PoCV2StoreCommit",
            "stage_start_height": stage,
            "count": count,
            "root": node_crypto::to_hex(&root),
        });
        if self
            .message_client
            .enqueue(
                current_height,
                ChainMessage { kind: MessageKind::PocBatch, merge_key: 0, payload },
            )
            .is_ok()
        {
            *self.last_committed.lock() = Some((count, root));
        }
    }

    fn maybe_distribute_weights(&self, stage: u64, current_height: u64) {
        let should_retry = match *self.last_distribution_attempt.lock() {
            None => true,
            Some(last) => last.elapsed() >= self.distribution_retry_interval,
        };
        if !should_retry {
            return;
        }
        *self.last_distribution_attempt.lock() = Some(Instant::now());

        let target_total = match *self.last_committed.lock() {
            Some((count, _)) => count,
            None => self.artifact_store.leaf_count(stage),
        };
        if target_total == 0 {
            return;
        }
        let raw_counts = self.distribution_source.node_counts(stage);
        let weights = distribute_weights(&raw_counts, target_total);
        let payload = serde_json::json!({
            "type": "MLNodeWeightDistribution",
            "stage_start_height": stage,
            "weights": weights,
        });
        if self
            .message_client
            .enqueue(
                current_height,
                ChainMessage { kind: MessageKind::PocBatch, merge_key: 0, payload },
            )
            .is_ok()
        {
            self.distribution_published.store(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_store::adapters::storage::memory::InMemoryArtifactLog;
    use artifact_store::ManagedArtifactStore;
    use chain_client::adapters::MockChainRpc;
    use chain_client::service::ChainClientService;
    use node_types::{ArtifactLeaf, Epoch, TxDeadlineTable};
    use phase_tracker::PhaseSnapshot;
    use std::collections::BTreeMap;

    struct NoDistribution;
    impl NodeDistributionSource for NoDistribution {
        fn node_counts(&self, _stage: u64) -> BTreeMap<String, u64> {
            let mut m = BTreeMap::new();
            m.insert("node-a".to_string(), 1);
            m
        }
    }

    fn epoch() -> Epoch {
        Epoch {
            epoch_index: 0,
            start_block_height: 0,
            poc_start_block_height: 100,
            epoch_length: 1_000,
            poc_stage_duration: 50,
            wind_down_blocks: 10,
        }
    }

    #[test]
    fn commits_store_root_once_artifacts_are_present() {
        let phase_tracker = PhaseTracker::new(PhaseSnapshot::genesis(epoch()));
        let artifact_store = Arc::new(ManagedArtifactStore::new(Arc::new(InMemoryArtifactLog::new())));
        artifact_store
            .submit(100, ArtifactLeaf { nonce: 1, vector: vec![9, 9] })
            .unwrap();
        let message_client = Arc::new(ChainClientService::new(
            Arc::new(MockChainRpc::new()),
            TxDeadlineTable::default(),
            Duration::from_secs(60),
        ));
        let worker = CommitWorker::new(
            phase_tracker,
            artifact_store,
            message_client,
            Arc::new(NoDistribution),
            Duration::from_secs(30),
        );
        worker.tick(100);
        assert!(worker.last_committed.lock().is_some());
    }
}
