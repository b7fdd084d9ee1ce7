//! Driven ports: chain-derived sampling/reporting data, the executor's
//! payload API, and the worker replay call, all kept behind traits so the
//! service can be exercised against in-memory doubles.

use std::collections::HashSet;

use async_trait::async_trait;
use node_types::{Address, EpochId, Hash, InferenceId, Node};

use crate::domain::errors::ValidatorError;
use crate::domain::sampling::{InferenceSummary, ValidationParams};
use crate::domain::scoring::PositionLogits;

#[async_trait]
pub trait ValidationChainQuery: Send + Sync {
    async fn validation_params(&self, epoch: EpochId) -> Result<ValidationParams, ValidatorError>;
    async fn epoch_seed(&self, epoch: EpochId) -> Result<Vec<u8>, ValidatorError>;
    /// Returns `(total_power, validator_power, executor_power)`.
    async fn powers(
        &self,
        epoch: EpochId,
        validator_address: &Address,
        executor_address: &Address,
    ) -> Result<(u64, u64, u64), ValidatorError>;
    async fn inference_epoch(&self, inference_id: &InferenceId) -> Result<EpochId, ValidatorError>;
    async fn inference_commitments(
        &self,
        inference_id: &InferenceId,
    ) -> Result<(Hash, Hash), ValidatorError>;
    async fn inference_executor(&self, inference_id: &InferenceId) -> Result<Address, ValidatorError>;
    /// Pre-upgrade inferences carry their payload on-chain; `None` once the
    /// executor-served payload API is the only source.
    async fn onchain_payload_fallback(
        &self,
        inference_id: &InferenceId,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, ValidatorError>;
    async fn is_invalidated(&self, inference_id: &InferenceId) -> Result<bool, ValidatorError>;
    async fn list_inferences(&self, epoch: EpochId) -> Result<Vec<InferenceSummary>, ValidatorError>;
    async fn submitted_validations(
        &self,
        epoch: EpochId,
        validator_address: &Address,
    ) -> Result<HashSet<InferenceId>, ValidatorError>;
}

pub struct ExecutorPayloadResponse {
    pub prompt_payload: Vec<u8>,
    pub response_payload: Vec<u8>,
    pub executor_signature: Vec<u8>,
    pub executor_pubkey: node_crypto::Ed25519PublicKey,
}

#[async_trait]
pub trait ExecutorClient: Send + Sync {
    async fn fetch_payload(
        &self,
        executor_host: &str,
        inference_id: &InferenceId,
        validator_address: &Address,
        epoch_id: EpochId,
        timestamp_ns: u128,
        signature_b64: &str,
    ) -> Result<ExecutorPayloadResponse, ValidatorError>;
}

pub struct ReplayRequest {
    pub original_enforced_tokens: Vec<String>,
    pub prompt: serde_json::Value,
}

pub struct ReplayResponse {
    pub logits: Vec<PositionLogits>,
}

#[async_trait]
pub trait WorkerReplayClient: Send + Sync {
    async fn replay(&self, node: &Node, request: ReplayRequest) -> Result<ReplayResponse, ValidatorError>;
}

/// Scoped worker reservation, mirroring `node_broker::NodeBrokerService`'s
/// `begin_lease`/`release_lease` pair behind an object-safe trait so the
/// validator service does not need to be generic over the broker's
/// transport type.
pub trait NodeLeasing: Send + Sync {
    fn begin_lease(&self, model: &str) -> Result<Node, ValidatorError>;
    fn release_lease(&self, node_id: &str);
}
