//! Driven port: the chain-derived data the authz and signature checks
//! need but that this crate does not own (epoch membership, commitments).

use async_trait::async_trait;
use node_types::{Address, EpochId, Hash, InferenceId};

use crate::domain::authz::GrantEntry;
use crate::domain::errors::ExecutorError;

#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Active validator pubkeys for the given epoch.
    async fn active_pubkeys_for_epoch(
        &self,
        epoch: EpochId,
    ) -> Result<Vec<GrantEntry>, ExecutorError>;

    /// Grantees authorized to sign `msg_type` on behalf of `granter`.
    async fn grantees(
        &self,
        granter: &Address,
        msg_type: &str,
    ) -> Result<Vec<GrantEntry>, ExecutorError>;

    /// The epoch the chain currently has recorded for this inference,
    /// used to reconcile an epoch-boundary race with the caller's claim.
    async fn inference_epoch(&self, inference_id: &InferenceId) -> Result<EpochId, ExecutorError>;

    /// On-chain commitments for an inference, used to cross-check a
    /// fallback payload served from the chain instead of this process.
    async fn inference_commitments(
        &self,
        inference_id: &InferenceId,
    ) -> Result<(Hash, Hash), ExecutorError>;
}

/// Driven port: records which node a V2 generated-artifact batch came
/// from. The artifact store's MMR log is not keyed by submitting node, so
/// attribution for the weight distribution commit-worker later computes
/// is tracked here instead, alongside ingestion.
pub trait ArtifactAttributionSink: Send + Sync {
    fn record(&self, stage_start_height: u64, node_id: &str, count: u64);
}
