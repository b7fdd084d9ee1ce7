//! In-memory doubles for the validator's outbound ports, used by tests
//! and as a starting point for a local/dev deployment.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use node_types::{Address, EpochId, Hash, InferenceId, Node};

use crate::domain::errors::ValidatorError;
use crate::domain::sampling::{InferenceSummary, ValidationParams};
use crate::ports::outbound::{
    ExecutorClient, ExecutorPayloadResponse, NodeLeasing, ReplayRequest, ReplayResponse,
    ValidationChainQuery, WorkerReplayClient,
};

#[derive(Default)]
pub struct MockValidationChainQuery {
    pub params: RwLock<HashMap<EpochId, ValidationParams>>,
    pub seeds: RwLock<HashMap<EpochId, Vec<u8>>>,
    pub powers: RwLock<HashMap<(EpochId, Address, Address), (u64, u64, u64)>>,
    pub inference_epochs: RwLock<HashMap<InferenceId, EpochId>>,
    pub commitments: RwLock<HashMap<InferenceId, (Hash, Hash)>>,
    pub executors: RwLock<HashMap<InferenceId, Address>>,
    pub onchain_fallback: RwLock<HashMap<InferenceId, (Vec<u8>, Vec<u8>)>>,
    pub invalidated: RwLock<HashSet<InferenceId>>,
    pub inferences_by_epoch: RwLock<HashMap<EpochId, Vec<InferenceSummary>>>,
    pub submitted: RwLock<HashMap<(EpochId, Address), HashSet<InferenceId>>>,
}

impl MockValidationChainQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValidationChainQuery for MockValidationChainQuery {
    async fn validation_params(&self, epoch: EpochId) -> Result<ValidationParams, ValidatorError> {
        self.params
            .read()
            .get(&epoch)
            .copied()
            .ok_or_else(|| ValidatorError::NotFound(format!("no validation params for epoch {epoch}")))
    }

    async fn epoch_seed(&self, epoch: EpochId) -> Result<Vec<u8>, ValidatorError> {
        self.seeds
            .read()
            .get(&epoch)
            .cloned()
            .ok_or_else(|| ValidatorError::NotFound(format!("no seed for epoch {epoch}")))
    }

    async fn powers(
        &self,
        epoch: EpochId,
        validator_address: &Address,
        executor_address: &Address,
    ) -> Result<(u64, u64, u64), ValidatorError> {
        self.powers
            .read()
            .get(&(epoch, validator_address.clone(), executor_address.clone()))
            .copied()
            .ok_or_else(|| ValidatorError::NotFound("no power data".to_string()))
    }

    async fn inference_epoch(&self, inference_id: &InferenceId) -> Result<EpochId, ValidatorError> {
        self.inference_epochs
            .read()
            .get(inference_id)
            .copied()
            .ok_or_else(|| ValidatorError::NotFound(inference_id.clone()))
    }

    async fn inference_commitments(
        &self,
        inference_id: &InferenceId,
    ) -> Result<(Hash, Hash), ValidatorError> {
        self.commitments
            .read()
            .get(inference_id)
            .copied()
            .ok_or_else(|| ValidatorError::NotFound(inference_id.clone()))
    }

    async fn inference_executor(&self, inference_id: &InferenceId) -> Result<Address, ValidatorError> {
        self.executors
            .read()
            .get(inference_id)
            .cloned()
            .ok_or_else(|| ValidatorError::NotFound(inference_id.clone()))
    }

    async fn onchain_payload_fallback(
        &self,
        inference_id: &InferenceId,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, ValidatorError> {
        Ok(self.onchain_fallback.read().get(inference_id).cloned())
    }

    async fn is_invalidated(&self, inference_id: &InferenceId) -> Result<bool, ValidatorError> {
        Ok(self.invalidated.read().contains(inference_id))
    }

    async fn list_inferences(&self, epoch: EpochId) -> Result<Vec<InferenceSummary>, ValidatorError> {
        Ok(self.inferences_by_epoch.read().get(&epoch).cloned().unwrap_or_default())
    }

    async fn submitted_validations(
        &self,
        epoch: EpochId,
        validator_address: &Address,
    ) -> Result<HashSet<InferenceId>, ValidatorError> {
        Ok(self
            .submitted
            .read()
            .get(&(epoch, validator_address.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockExecutorClient {
    pub responses: RwLock<HashMap<InferenceId, ExecutorPayloadResponseTemplate>>,
}

#[derive(Clone)]
pub struct ExecutorPayloadResponseTemplate {
    pub prompt_payload: Vec<u8>,
    pub response_payload: Vec<u8>,
    pub signing_key_seed: [u8; 32],
}

impl MockExecutorClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutorClient for MockExecutorClient {
    async fn fetch_payload(
        &self,
        _executor_host: &str,
        inference_id: &InferenceId,
        _validator_address: &Address,
        _epoch_id: EpochId,
        _timestamp_ns: u128,
        _signature_b64: &str,
    ) -> Result<ExecutorPayloadResponse, ValidatorError> {
        let template = self
            .responses
            .read()
            .get(inference_id)
            .cloned()
            .ok_or_else(|| ValidatorError::PayloadUnavailable(inference_id.clone()))?;
        let keypair = node_crypto::Ed25519KeyPair::from_seed(template.signing_key_seed);
        let prompt_hash = node_crypto::hashing::payload_hash(&template.prompt_payload);
        let response_hash = node_crypto::hashing::payload_hash(&template.response_payload);
        let signing_message =
            node_crypto::hashing::hash_many(&[inference_id.as_bytes(), &prompt_hash, &response_hash]);
        let signature = keypair.sign(&signing_message);
        Ok(ExecutorPayloadResponse {
            prompt_payload: template.prompt_payload,
            response_payload: template.response_payload,
            executor_signature: signature.as_bytes().to_vec(),
            executor_pubkey: keypair.public_key(),
        })
    }
}

#[derive(Default)]
pub struct MockWorkerReplayClient {
    pub replies: RwLock<HashMap<String, ReplayResponseTemplate>>,
}

#[derive(Clone)]
pub struct ReplayResponseTemplate {
    pub logits: Vec<crate::domain::scoring::PositionLogits>,
}

impl MockWorkerReplayClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkerReplayClient for MockWorkerReplayClient {
    async fn replay(&self, node: &Node, _request: ReplayRequest) -> Result<ReplayResponse, ValidatorError> {
        let template = self
            .replies
            .read()
            .get(&node.id)
            .cloned()
            .ok_or_else(|| ValidatorError::TransientRemote(format!("no reply configured for {}", node.id)))?;
        Ok(ReplayResponse { logits: template.logits })
    }
}

#[derive(Default)]
pub struct MockNodeLeasing {
    pub node: RwLock<Option<Node>>,
}

impl MockNodeLeasing {
    pub fn new(node: Node) -> Self {
        Self { node: RwLock::new(Some(node)) }
    }
}

impl NodeLeasing for MockNodeLeasing {
    fn begin_lease(&self, model: &str) -> Result<Node, ValidatorError> {
        self.node
            .read()
            .clone()
            .filter(|n| n.models.iter().any(|m| m.model_id == model))
            .ok_or_else(|| ValidatorError::NoNodesAvailable(model.to_string()))
    }

    fn release_lease(&self, _node_id: &str) {}
}
