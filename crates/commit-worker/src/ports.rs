//! Driven port: per-node artifact submission counts for the current PoC
//! stage, used to compute the weight distribution. Kept separate from
//! `artifact-store`'s port because the MMR log itself is not keyed by
//! submitting node — attribution is tracked alongside ingestion.

use std::collections::BTreeMap;

pub trait NodeDistributionSource: Send + Sync {
    fn node_counts(&self, stage_start_height: u64) -> BTreeMap<String, u64>;
}
