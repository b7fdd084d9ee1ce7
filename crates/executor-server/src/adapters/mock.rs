//! In-memory `ChainQuery` used by tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use node_types::{Address, EpochId, Hash, InferenceId};

use crate::domain::authz::GrantEntry;
use crate::domain::errors::ExecutorError;
use crate::ports::outbound::{ArtifactAttributionSink, ChainQuery};

#[derive(Default)]
pub struct MockChainQuery {
    pub epoch_pubkeys: RwLock<HashMap<EpochId, Vec<GrantEntry>>>,
    pub grantees: RwLock<HashMap<(Address, String), Vec<GrantEntry>>>,
    pub inference_epochs: RwLock<HashMap<InferenceId, EpochId>>,
    pub commitments: RwLock<HashMap<InferenceId, (Hash, Hash)>>,
}

impl MockChainQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChainQuery for MockChainQuery {
    async fn active_pubkeys_for_epoch(
        &self,
        epoch: EpochId,
    ) -> Result<Vec<GrantEntry>, ExecutorError> {
        Ok(self.epoch_pubkeys.read().get(&epoch).cloned().unwrap_or_default())
    }

    async fn grantees(&self, granter: &Address, msg_type: &str) -> Result<Vec<GrantEntry>, ExecutorError> {
        Ok(self
            .grantees
            .read()
            .get(&(granter.clone(), msg_type.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn inference_epoch(&self, inference_id: &InferenceId) -> Result<EpochId, ExecutorError> {
        self.inference_epochs
            .read()
            .get(inference_id)
            .copied()
            .ok_or_else(|| ExecutorError::NotFound(inference_id.clone()))
    }

    async fn inference_commitments(
        &self,
        inference_id: &InferenceId,
    ) -> Result<(Hash, Hash), ExecutorError> {
        self.commitments
            .read()
            .get(inference_id)
            .copied()
            .ok_or_else(|| ExecutorError::NotFound(inference_id.clone()))
    }
}

/// Attribution sink that discards every record. Used where a deployment
/// does not care about per-node weight distribution (v2 disabled, tests).
#[derive(Default)]
pub struct NullAttributionSink;

impl ArtifactAttributionSink for NullAttributionSink {
    fn record(&self, _stage_start_height: u64, _node_id: &str, _count: u64) {}
}
