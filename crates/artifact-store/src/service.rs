//! `ManagedArtifactStore`: the service that owns one `StageLog` per PoC
//! stage, backed by a durable `ArtifactLogBackend`, and implements
//! `ArtifactStorePort` for the rest of the node.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use node_types::{ArtifactLeaf, CoreError};

use crate::domain::{ArtifactProof, ArtifactStoreError, StageLog};
use crate::ports::inbound::ArtifactStorePort;
use crate::ports::outbound::ArtifactLogBackend;

pub struct ManagedArtifactStore {
    backend: Arc<dyn ArtifactLogBackend>,
    stages: RwLock<BTreeMap<u64, StageLog>>,
}

impl ManagedArtifactStore {
    pub fn new(backend: Arc<dyn ArtifactLogBackend>) -> Self {
        Self {
            backend,
            stages: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rebuild a stage's in-memory MMR from the durable log, typically at
    /// process start or the first touch of a stage.
    fn ensure_loaded(&self, stage_start_height: u64) -> Result<(), CoreError> {
        if self.stages.read().contains_key(&stage_start_height) {
            return Ok(());
        }
        let leaves = self
            .backend
            .load(stage_start_height)
            .map_err(|e| CoreError::TransientRemote(e.to_string()))?;
        let log = StageLog::from_leaves(stage_start_height, &leaves);
        self.stages.write().entry(stage_start_height).or_insert(log);
        Ok(())
    }
}

impl ArtifactStorePort for ManagedArtifactStore {
    fn submit(&self, stage_start_height: u64, leaf: ArtifactLeaf) -> Result<u64, CoreError> {
        self.ensure_loaded(stage_start_height)?;
        let mut stages = self.stages.write();
        let log = stages.get_mut(&stage_start_height).expect("just loaded");
        if log.has_nonce(leaf.nonce) {
            return Err(ArtifactStoreError::DuplicateNonce(leaf.nonce).into());
        }
        self.backend
            .append(stage_start_height, &leaf)
            .map_err(|e| CoreError::TransientRemote(e.to_string()))?;
        Ok(log.insert(&leaf))
    }

    fn root(&self, stage_start_height: u64) -> Result<[u8; 32], CoreError> {
        self.ensure_loaded(stage_start_height)?;
        self.stages
            .read()
            .get(&stage_start_height)
            .and_then(|log| log.mmr.root())
            .ok_or_else(|| CoreError::NotFound(format!("no leaves in stage {stage_start_height}")))
    }

    fn prove(&self, stage_start_height: u64, leaf_index: u64) -> Result<ArtifactProof, CoreError> {
        self.ensure_loaded(stage_start_height)?;
        self.stages
            .read()
            .get(&stage_start_height)
            .and_then(|log| log.mmr.prove(leaf_index))
            .ok_or_else(|| ArtifactStoreError::LeafOutOfRange(leaf_index).into())
    }

    fn get_artifact(&self, stage_start_height: u64, leaf_index: u64) -> Result<ArtifactLeaf, CoreError> {
        self.ensure_loaded(stage_start_height)?;
        self.stages
            .read()
            .get(&stage_start_height)
            .and_then(|log| log.leaf_at(leaf_index))
            .cloned()
            .ok_or_else(|| ArtifactStoreError::LeafOutOfRange(leaf_index).into())
    }

    fn leaf_count(&self, stage_start_height: u64) -> u64 {
        self.stages
            .read()
            .get(&stage_start_height)
            .map(|log| log.mmr.len())
            .unwrap_or(0)
    }

    fn prune(&self, cutoff: u64, retain: usize) {
        let mut stages = self.stages.write();
        let keep_from = {
            let mut heights: Vec<u64> = stages.keys().copied().collect();
            heights.sort_unstable();
            heights.len().saturating_sub(retain)
        };
        let to_drop: Vec<u64> = stages
            .keys()
            .copied()
            .enumerate()
            .filter(|(i, h)| *h < cutoff && *i < keep_from)
            .map(|(_, h)| h)
            .collect();
        for h in to_drop {
            stages.remove(&h);
            let _ = self.backend.delete(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryArtifactLog;

    fn store() -> ManagedArtifactStore {
        ManagedArtifactStore::new(Arc::new(InMemoryArtifactLog::new()))
    }

    #[test]
    fn submit_then_root_and_prove_round_trip() {
        let store = store();
        store
            .submit(100, ArtifactLeaf { nonce: 1, vector: vec![1, 2] })
            .unwrap();
        store
            .submit(100, ArtifactLeaf { nonce: 2, vector: vec![3, 4] })
            .unwrap();
        let root = store.root(100).unwrap();
        let proof = store.prove(100, 1).unwrap();
        assert!(proof.verify(&root));
    }

    #[test]
    fn duplicate_nonce_rejected() {
        let store = store();
        store
            .submit(100, ArtifactLeaf { nonce: 1, vector: vec![1] })
            .unwrap();
        let err = store
            .submit(100, ArtifactLeaf { nonce: 1, vector: vec![2] })
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateNonce(1)));
    }

    #[test]
    fn get_artifact_returns_the_leaf_at_its_submitted_position() {
        let store = store();
        store
            .submit(100, ArtifactLeaf { nonce: 1, vector: vec![1, 2] })
            .unwrap();
        let idx = store
            .submit(100, ArtifactLeaf { nonce: 2, vector: vec![3, 4] })
            .unwrap();
        let leaf = store.get_artifact(100, idx).unwrap();
        assert_eq!(leaf, ArtifactLeaf { nonce: 2, vector: vec![3, 4] });
        assert!(store.get_artifact(100, idx + 1).is_err());
    }

    #[test]
    fn root_missing_stage_is_not_found() {
        let store = store();
        assert!(matches!(store.root(1).unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn prune_drops_old_stages_but_keeps_retain_count() {
        let store = store();
        for stage in [100u64, 200, 300] {
            store
                .submit(stage, ArtifactLeaf { nonce: 1, vector: vec![0] })
                .unwrap();
        }
        store.prune(250, 1);
        assert_eq!(store.leaf_count(100), 0);
        assert_eq!(store.leaf_count(200), 0);
        assert_eq!(store.leaf_count(300), 1);
    }
}
