//! `Validator`: samples inferences for revalidation, retrieves the
//! executor's reported payload, replays it on a leased local worker, scores
//! the replay against the original logits, and reports the result
//! on-chain.

use std::sync::Arc;
use std::time::Duration;

use chain_client::ports::inbound::MessageClient;
use node_types::{ChainMessage, EpochId, InferenceId, MessageKind};

use crate::domain::errors::ValidatorError;
use crate::domain::retry::{
    is_epoch_stale, should_keep_retrying_lock, should_keep_retrying_payload, LOCK_RETRY_INTERVAL,
    PAYLOAD_RETRY_INTERVAL,
};
use crate::domain::sampling::{detect_missed_validations, is_eligible, should_validate};
use crate::domain::scoring::{score_replay, PositionLogits, ScoreOutcome};
use crate::ports::outbound::{ExecutorClient, NodeLeasing, ReplayRequest, ValidationChainQuery, WorkerReplayClient};

/// One validation pass's outcome, reported on-chain regardless of which
/// way it came out — a negative score is evidence too.
pub struct ValidationReport {
    pub inference_id: InferenceId,
    pub outcome: ScoreOutcome,
}

pub struct Validator<CQ, EC, WR, NL, MC> {
    chain_query: Arc<CQ>,
    executor_client: Arc<EC>,
    worker_replay: Arc<WR>,
    leasing: Arc<NL>,
    message_client: Arc<MC>,
    validator_address: String,
    model_id: String,
}

impl<CQ, EC, WR, NL, MC> Validator<CQ, EC, WR, NL, MC>
where
    CQ: ValidationChainQuery,
    EC: ExecutorClient,
    WR: WorkerReplayClient,
    NL: NodeLeasing,
    MC: MessageClient,
{
    pub fn new(
        chain_query: Arc<CQ>,
        executor_client: Arc<EC>,
        worker_replay: Arc<WR>,
        leasing: Arc<NL>,
        message_client: Arc<MC>,
        validator_address: String,
        model_id: String,
    ) -> Self {
        Self {
            chain_query,
            executor_client,
            worker_replay,
            leasing,
            message_client,
            validator_address,
            model_id,
        }
    }

    /// Decides whether `inference_id` should be revalidated by this
    /// validator and, if so, runs the full retrieve/replay/score/report
    /// pipeline. Returns `Ok(None)` when sampling excludes the inference.
    pub async fn consider_inference(
        &self,
        epoch: EpochId,
        inference_id: &InferenceId,
        executor_host: &str,
        current_height: u64,
    ) -> Result<Option<ValidationReport>, ValidatorError> {
        let executor_address = self.chain_query.inference_executor(inference_id).await?;
        let (total_power, validator_power, executor_power) =
            self.chain_query.powers(epoch, &self.validator_address, &executor_address).await?;
        if !is_eligible(&executor_address, &self.validator_address, total_power, executor_power) {
            return Ok(None);
        }

        let params = self.chain_query.validation_params(epoch).await?;
        let seed = self.chain_query.epoch_seed(epoch).await?;
        if !should_validate(
            &seed,
            inference_id,
            &self.validator_address,
            total_power,
            validator_power,
            executor_power,
            &params,
        ) {
            return Ok(None);
        }

        let outcome = self.validate_inference(epoch, inference_id, executor_host, current_height).await?;
        Ok(Some(outcome))
    }

    /// Runs retrieval, replay, scoring and reporting for an inference
    /// already known to be sampled, bypassing the sampling check. Used by
    /// [`Self::recover_missed`] to revalidate inferences a restart caused
    /// this validator to skip.
    pub async fn validate_inference(
        &self,
        epoch: EpochId,
        inference_id: &InferenceId,
        executor_host: &str,
        current_height: u64,
    ) -> Result<ValidationReport, ValidatorError> {
        if self.chain_query.is_invalidated(inference_id).await? {
            return Err(ValidatorError::Validation(format!("{inference_id} already invalidated")));
        }

        let (prompt_payload, response_payload) =
            self.retrieve_payload(epoch, inference_id, executor_host).await?;
        let (expected_prompt_hash, expected_response_hash) =
            self.chain_query.inference_commitments(inference_id).await?;
        let prompt_hash = node_crypto::hashing::payload_hash(&prompt_payload);
        let response_hash = node_crypto::hashing::payload_hash(&response_payload);
        if prompt_hash != expected_prompt_hash || response_hash != expected_response_hash {
            return Err(ValidatorError::HashMismatch(inference_id.clone()));
        }

        let original: Vec<PositionLogits> = serde_json::from_slice(&response_payload)
            .map_err(|e| ValidatorError::Validation(format!("malformed response payload: {e}")))?;
        let prompt: serde_json::Value = serde_json::from_slice(&prompt_payload)
            .map_err(|e| ValidatorError::Validation(format!("malformed prompt payload: {e}")))?;

        let outcome = self.replay_and_score(&original, prompt, current_height).await?;
        self.report(epoch, inference_id, &outcome, current_height)?;
        Ok(ValidationReport { inference_id: inference_id.clone(), outcome })
    }

    async fn retrieve_payload(
        &self,
        epoch: EpochId,
        inference_id: &InferenceId,
        executor_host: &str,
    ) -> Result<(Vec<u8>, Vec<u8>), ValidatorError> {
        if let Some(payload) = self.chain_query.onchain_payload_fallback(inference_id).await? {
            return Ok(payload);
        }

        let mut attempt = 0u32;
        loop {
            let inference_epoch = self.chain_query.inference_epoch(inference_id).await?;
            if is_epoch_stale(epoch, inference_epoch) {
                return Err(ValidatorError::EpochStale(inference_id.clone()));
            }

            let timestamp_ns = attempt as u128;
            let signature_b64 = String::new();
            match self
                .executor_client
                .fetch_payload(
                    executor_host,
                    inference_id,
                    &self.validator_address,
                    epoch,
                    timestamp_ns,
                    &signature_b64,
                )
                .await
            {
                Ok(response) => return Ok((response.prompt_payload, response.response_payload)),
                Err(_) if should_keep_retrying_payload(attempt) => {
                    attempt += 1;
                    tokio::time::sleep(PAYLOAD_RETRY_INTERVAL).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn replay_and_score(
        &self,
        original: &[PositionLogits],
        prompt: serde_json::Value,
        _current_height: u64,
    ) -> Result<ScoreOutcome, ValidatorError> {
        let node = self.leasing.begin_lease(&self.model_id)?;
        let request = ReplayRequest {
            original_enforced_tokens: original.iter().map(|p| p.token.clone()).collect(),
            prompt,
        };
        let replayed = self.worker_replay.replay(&node, request).await;
        self.leasing.release_lease(&node.id);
        let replayed = replayed?;
        Ok(score_replay(original, &replayed.logits))
    }

    fn report(
        &self,
        epoch: EpochId,
        inference_id: &InferenceId,
        outcome: &ScoreOutcome,
        current_height: u64,
    ) -> Result<(), ValidatorError> {
        let payload = serde_json::json!({
            "type": "PoCValidation",
            "epoch": epoch,
            "inference_id": inference_id,
            "validator": self.validator_address,
            "similarity": outcome.similarity(),
            "successful": outcome.is_successful(),
        });
        self.message_client
            .enqueue(
                current_height,
                ChainMessage { kind: MessageKind::PocValidation, merge_key: 0, payload },
            )
            .map_err(|e| ValidatorError::TransientRemote(e.to_string()))
    }

    /// Reports `outcome` with a blocking-retry loop bounded by the same
    /// schedule used for lock acquisition, for callers that need the
    /// submission to land before moving on (recovery after a restart).
    pub async fn report_with_retry(
        &self,
        epoch: EpochId,
        inference_id: &InferenceId,
        outcome: &ScoreOutcome,
        current_height: u64,
    ) -> Result<(), ValidatorError> {
        let mut attempt = 0u32;
        loop {
            match self.report(epoch, inference_id, outcome, current_height) {
                Ok(()) => return Ok(()),
                Err(e) if should_keep_retrying_lock(attempt) => {
                    attempt += 1;
                    tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                    let _ = e;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Recomputes which inferences in `epoch` this validator should have
    /// sampled and returns the ones not yet reported, for a restarted
    /// validator to catch up on.
    pub async fn recover_missed(&self, epoch: EpochId) -> Result<Vec<InferenceId>, ValidatorError> {
        let params = self.chain_query.validation_params(epoch).await?;
        let seed = self.chain_query.epoch_seed(epoch).await?;
        let inferences = self.chain_query.list_inferences(epoch).await?;
        let already_submitted = self.chain_query.submitted_validations(epoch, &self.validator_address).await?;

        let mut executor_powers = std::collections::HashMap::new();
        let mut total_power = 0u64;
        let mut validator_power = 0u64;
        for inf in &inferences {
            if !executor_powers.contains_key(&inf.executor_address) {
                let (total, validator, executor) =
                    self.chain_query.powers(epoch, &self.validator_address, &inf.executor_address).await?;
                total_power = total;
                validator_power = validator;
                executor_powers.insert(inf.executor_address.clone(), executor);
            }
        }

        Ok(detect_missed_validations(
            &seed,
            &inferences,
            total_power,
            validator_power,
            |addr| executor_powers.get(addr).copied().unwrap_or(0),
            &self.validator_address,
            &params,
            &already_submitted,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{
        ExecutorPayloadResponseTemplate, MockExecutorClient, MockNodeLeasing, MockValidationChainQuery,
        MockWorkerReplayClient, ReplayResponseTemplate,
    };
    use crate::domain::sampling::ValidationParams;
    use chain_client::adapters::MockChainRpc;
    use chain_client::service::ChainClientService;
    use node_types::{Node, TxDeadlineTable};
    use std::collections::BTreeMap as StdBTreeMap;

    fn node(id: &str, model: &str) -> Node {
        Node {
            id: id.to_string(),
            host: "127.0.0.1".to_string(),
            inference_segment: "/infer".to_string(),
            inference_port: 9000,
            poc_segment: "/poc".to_string(),
            poc_port: 9001,
            models: vec![node_types::ModelConfig { model_id: model.to_string(), args: StdBTreeMap::new() }],
            max_concurrent: 4,
            node_num: 1,
            hardware: Vec::new(),
        }
    }

    fn position(token: &str, logprob: f64) -> PositionLogits {
        let mut top = crate::domain::scoring::TopLogprobs::new();
        top.insert(token.to_string(), logprob);
        PositionLogits { token: token.to_string(), top_logprobs: top }
    }

    fn message_client() -> Arc<ChainClientService<MockChainRpc>> {
        Arc::new(ChainClientService::new(
            Arc::new(MockChainRpc::new()),
            TxDeadlineTable::default(),
            Duration::from_secs(60),
        ))
    }

    #[tokio::test]
    async fn ineligible_sampling_skips_without_touching_executor_or_worker() {
        let chain_query = Arc::new(MockValidationChainQuery::new());
        chain_query.executors.write().insert("inf-1".to_string(), "val-1".to_string());
        chain_query
            .powers
            .write()
            .insert((1, "val-1".to_string(), "val-1".to_string()), (1000, 500, 500));

        let validator = Validator::new(
            chain_query,
            Arc::new(MockExecutorClient::new()),
            Arc::new(MockWorkerReplayClient::new()),
            Arc::new(MockNodeLeasing::new(node("node-1", "model-a"))),
            message_client(),
            "val-1".to_string(),
            "model-a".to_string(),
        );

        let result = validator.consider_inference(1, &"inf-1".to_string(), "executor.local", 10).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn full_pipeline_scores_a_faithful_replay_as_successful() {
        let original = vec![position("a", -0.1), position("b", -0.2)];
        let prompt_payload = serde_json::to_vec(&serde_json::json!({"prompt": "hi"})).unwrap();
        let response_payload = serde_json::to_vec(&original).unwrap();
        let prompt_hash = node_crypto::hashing::payload_hash(&prompt_payload);
        let response_hash = node_crypto::hashing::payload_hash(&response_payload);

        let chain_query = Arc::new(MockValidationChainQuery::new());
        chain_query.executors.write().insert("inf-1".to_string(), "exec-1".to_string());
        chain_query
            .powers
            .write()
            .insert((1, "val-1".to_string(), "exec-1".to_string()), (1000, 900, 50));
        chain_query.params.write().insert(1, ValidationParams { sample_rate_bps: 10_000 });
        chain_query.seeds.write().insert(1, b"seed".to_vec());
        chain_query.inference_epochs.write().insert("inf-1".to_string(), 1);
        chain_query.commitments.write().insert("inf-1".to_string(), (prompt_hash, response_hash));

        let executor_client = Arc::new(MockExecutorClient::new());
        executor_client.responses.write().insert(
            "inf-1".to_string(),
            ExecutorPayloadResponseTemplate {
                prompt_payload,
                response_payload,
                signing_key_seed: [7u8; 32],
            },
        );

        let worker_node = node("node-1", "model-a");
        let worker_replay = Arc::new(MockWorkerReplayClient::new());
        worker_replay
            .replies
            .write()
            .insert("node-1".to_string(), ReplayResponseTemplate { logits: original.clone() });

        let validator = Validator::new(
            chain_query,
            executor_client,
            worker_replay,
            Arc::new(MockNodeLeasing::new(worker_node)),
            message_client(),
            "val-1".to_string(),
            "model-a".to_string(),
        );

        let report = validator
            .consider_inference(1, &"inf-1".to_string(), "executor.local", 10)
            .await
            .unwrap()
            .expect("sampling should select this inference at full sample rate");
        assert!(report.outcome.is_successful());
    }

    #[tokio::test]
    async fn hash_mismatch_is_not_retried() {
        let prompt_payload = b"prompt".to_vec();
        let response_payload = b"response".to_vec();

        let chain_query = Arc::new(MockValidationChainQuery::new());
        chain_query.executors.write().insert("inf-1".to_string(), "exec-1".to_string());
        chain_query
            .powers
            .write()
            .insert((1, "val-1".to_string(), "exec-1".to_string()), (1000, 900, 50));
        chain_query.params.write().insert(1, ValidationParams { sample_rate_bps: 10_000 });
        chain_query.seeds.write().insert(1, b"seed".to_vec());
        chain_query.inference_epochs.write().insert("inf-1".to_string(), 1);
        chain_query.commitments.write().insert("inf-1".to_string(), ([0u8; 32], [0u8; 32]));

        let executor_client = Arc::new(MockExecutorClient::new());
        executor_client.responses.write().insert(
            "inf-1".to_string(),
            ExecutorPayloadResponseTemplate {
                prompt_payload,
                response_payload,
                signing_key_seed: [7u8; 32],
            },
        );

        let validator = Validator::new(
            chain_query,
            executor_client,
            Arc::new(MockWorkerReplayClient::new()),
            Arc::new(MockNodeLeasing::new(node("node-1", "model-a"))),
            message_client(),
            "val-1".to_string(),
            "model-a".to_string(),
        );

        let err = validator
            .consider_inference(1, &"inf-1".to_string(), "executor.local", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidatorError::HashMismatch(_)));
    }
}
