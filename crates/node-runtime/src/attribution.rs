//! Bridges `executor-server`'s artifact-ingestion callback to
//! `commit-worker`'s weight-distribution input. Neither crate depends on
//! the other's port; this type implements both so a single `Arc` can sit
//! on both sides of the wire-up.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use commit_worker::NodeDistributionSource;
use executor_server::ports::outbound::ArtifactAttributionSink;

/// In-memory per-stage, per-node artifact counts. Bounded by retaining
/// only the stages `commit-worker` could plausibly still be asking about;
/// the container prunes older entries alongside the artifact store.
pub struct AttributionTracker {
    counts: Mutex<BTreeMap<u64, BTreeMap<String, u64>>>,
}

impl AttributionTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { counts: Mutex::new(BTreeMap::new()) })
    }

    /// Drop every stage strictly before `cutoff`, mirroring the artifact
    /// store's own retention so this tracker never outlives the data it
    /// describes.
    pub fn prune(&self, cutoff: u64) {
        self.counts.lock().retain(|&stage, _| stage >= cutoff);
    }
}

impl ArtifactAttributionSink for AttributionTracker {
    fn record(&self, stage_start_height: u64, node_id: &str, count: u64) {
        let mut counts = self.counts.lock();
        let stage = counts.entry(stage_start_height).or_default();
        *stage.entry(node_id.to_string()).or_insert(0) += count;
    }
}

impl NodeDistributionSource for AttributionTracker {
    fn node_counts(&self, stage_start_height: u64) -> BTreeMap<String, u64> {
        self.counts.lock().get(&stage_start_height).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_stage_and_node() {
        let tracker = AttributionTracker::new();
        tracker.record(100, "node-a", 3);
        tracker.record(100, "node-a", 2);
        tracker.record(100, "node-b", 1);
        tracker.record(200, "node-a", 9);

        let stage_100 = tracker.node_counts(100);
        assert_eq!(stage_100.get("node-a"), Some(&5));
        assert_eq!(stage_100.get("node-b"), Some(&1));
        assert_eq!(tracker.node_counts(200).get("node-a"), Some(&9));
    }

    #[test]
    fn prune_drops_stages_before_cutoff() {
        let tracker = AttributionTracker::new();
        tracker.record(100, "node-a", 1);
        tracker.record(200, "node-a", 1);
        tracker.prune(200);
        assert!(tracker.node_counts(100).is_empty());
        assert!(!tracker.node_counts(200).is_empty());
    }
}
