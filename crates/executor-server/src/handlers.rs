//! Route handlers for the payload, proof, and V2 artifact callback
//! endpoints. Handlers only translate HTTP <-> domain calls; every
//! freshness/authz/signature decision lives in `domain`.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use node_crypto::hashing;
use node_crypto::Ed25519PublicKey;
use node_types::{ArtifactLeaf, ChainMessage, MessageKind, PayloadKey};

use crate::domain::authz::GrantEntry;
use crate::domain::errors::ExecutorError;
use crate::domain::signed_request::{validate_timestamp, verify_any};
use crate::state::ExecutorServerState;

fn now_nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ExecutorError> {
    headers
        .get(name)
        .ok_or_else(|| ExecutorError::BadRequest(format!("missing header {name}")))?
        .to_str()
        .map_err(|_| ExecutorError::BadRequest(format!("header {name} is not valid utf-8")))
}

// ---------------------------------------------------------------------------
// GET /v1/inference/payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PayloadQuery {
    pub inference_id: String,
}

#[derive(Debug, Serialize)]
pub struct PayloadResponse {
    pub prompt_payload_b64: String,
    pub response_payload_b64: String,
    pub executor_signature_b64: String,
}

pub async fn get_payload(
    State(state): State<Arc<ExecutorServerState>>,
    Query(query): Query<PayloadQuery>,
    headers: HeaderMap,
) -> Result<Json<PayloadResponse>, ExecutorError> {
    let validator_address = header_str(&headers, "x-validator-address")?.to_string();
    let timestamp: u128 = header_str(&headers, "x-timestamp")?
        .parse()
        .map_err(|_| ExecutorError::BadRequest("x-timestamp is not a number".to_string()))?;
    let claimed_epoch: u64 = header_str(&headers, "x-epoch-id")?
        .parse()
        .map_err(|_| ExecutorError::BadRequest("x-epoch-id is not a number".to_string()))?;
    let signature = header_str(&headers, "authorization")?.to_string();

    validate_timestamp(timestamp, now_nanos())?;

    let allowed = resolve_allowed_pubkeys(&state, claimed_epoch, &validator_address).await?;
    if allowed.is_empty() {
        return Err(ExecutorError::Unauthorized(
            "validator is not an active participant at the claimed epoch".to_string(),
        ));
    }

    let message = format!("{}{}{}", query.inference_id, claimed_epoch, timestamp);
    let pubkeys: Vec<Ed25519PublicKey> = allowed.iter().map(|g| g.pubkey).collect();
    verify_any(&pubkeys, message.as_bytes(), &signature)?;

    let epoch = match state.chain_query.inference_epoch(&query.inference_id).await {
        Ok(chain_epoch) => chain_epoch,
        Err(_) => claimed_epoch,
    };

    let record = fetch_payload_with_epoch_fallback(&state, epoch, &query.inference_id)?;

    let signing_message = hashing::hash_many(&[
        query.inference_id.as_bytes(),
        &record.prompt_hash,
        &record.response_hash,
    ]);
    let executor_signature = state.signing_key.sign(&signing_message);

    Ok(Json(PayloadResponse {
        prompt_payload_b64: BASE64.encode(&record.prompt_payload),
        response_payload_b64: BASE64.encode(&record.response_payload),
        executor_signature_b64: BASE64.encode(executor_signature.as_bytes()),
    }))
}

async fn resolve_allowed_pubkeys(
    state: &ExecutorServerState,
    epoch: u64,
    validator_address: &str,
) -> Result<Vec<GrantEntry>, ExecutorError> {
    let active = state.chain_query.active_pubkeys_for_epoch(epoch).await?;
    let Some(primary) = active.iter().find(|g| g.address == validator_address) else {
        return Ok(Vec::new());
    };
    let mut allowed = vec![primary.clone()];

    let granter = validator_address.to_string();
    let msg_type = MessageKind::PocValidation.type_url();
    let grantees = match state.authz_cache.peek(&granter, msg_type) {
        Some(cached) => cached,
        None => {
            let fetched = state.chain_query.grantees(&granter, msg_type).await?;
            state.authz_cache.put(&granter, msg_type, fetched.clone());
            fetched
        }
    };
    allowed.extend(grantees);
    Ok(allowed)
}

fn fetch_payload_with_epoch_fallback(
    state: &ExecutorServerState,
    epoch: u64,
    inference_id: &str,
) -> Result<node_types::PayloadRecord, ExecutorError> {
    let primary = PayloadKey { epoch_id: epoch, inference_id: inference_id.to_string() };
    if let Ok(record) = state.payload_store.get(&primary) {
        return Ok(record);
    }
    for candidate_epoch in [epoch.saturating_sub(1), epoch + 1] {
        let key = PayloadKey { epoch_id: candidate_epoch, inference_id: inference_id.to_string() };
        if let Ok(record) = state.payload_store.get(&key) {
            return Ok(record);
        }
    }
    Err(ExecutorError::NotFound(format!(
        "no payload for inference {inference_id} at epoch {epoch} or its neighbors"
    )))
}

// ---------------------------------------------------------------------------
// POST /v1/poc/proofs
// ---------------------------------------------------------------------------

const MAX_PROOF_BATCH: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ProofRequest {
    pub height: u64,
    pub root_hex: String,
    pub count: u64,
    pub leaf_indices: Vec<u64>,
    pub timestamp: u128,
    pub validator_address: String,
    pub signer_address: String,
    pub signature_b64: String,
}

#[derive(Debug, Serialize)]
pub struct ProofEntry {
    pub leaf_index: u64,
    pub nonce: i32,
    pub vector_b64: String,
    pub proof: ProofDto,
}

#[derive(Debug, Serialize)]
pub struct ProofDto {
    pub leaf_hex: String,
    pub path: Vec<(String, bool)>,
    pub peak_index: usize,
    pub other_peaks: Vec<(usize, String)>,
}

pub async fn get_proofs(
    State(state): State<Arc<ExecutorServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<ProofRequest>,
) -> Result<Json<Vec<ProofEntry>>, ExecutorError> {
    rate_limit_by_ip(&state, addr.ip())?;

    validate_timestamp(request.timestamp, now_nanos())?;
    if request.leaf_indices.len() > MAX_PROOF_BATCH {
        return Err(ExecutorError::BadRequest(format!(
            "at most {MAX_PROOF_BATCH} leaf indices per request"
        )));
    }

    let binding = format!(
        "{}{}{}{:?}{}{}{}",
        request.height,
        request.root_hex,
        request.count,
        request.leaf_indices,
        request.timestamp,
        request.validator_address,
        request.signer_address,
    );
    let signer_entries = state
        .chain_query
        .active_pubkeys_for_epoch(request.height)
        .await
        .unwrap_or_default();
    let pubkeys: Vec<Ed25519PublicKey> = signer_entries
        .iter()
        .filter(|g| g.address == request.signer_address)
        .map(|g| g.pubkey)
        .collect();
    verify_any(&pubkeys, binding.as_bytes(), &request.signature_b64)?;

    let actual_root = state.artifact_store.root(request.height)?;
    let actual_count = state.artifact_store.leaf_count(request.height);
    if hashing::to_hex(&actual_root) != request.root_hex || actual_count != request.count {
        return Err(ExecutorError::BadRequest(
            "root/count do not match the artifact store at this height".to_string(),
        ));
    }

    let mut entries = Vec::with_capacity(request.leaf_indices.len());
    for &index in &request.leaf_indices {
        if index >= request.count {
            return Err(ExecutorError::BadRequest(format!(
                "leaf index {index} is out of range for count {}",
                request.count
            )));
        }
        let proof = state.artifact_store.prove(request.height, index)?;
        let leaf = state.artifact_store.get_artifact(request.height, index)?;
        entries.push(ProofEntry {
            leaf_index: index,
            nonce: leaf.nonce,
            vector_b64: BASE64.encode(&leaf.vector),
            proof: ProofDto {
                leaf_hex: hashing::to_hex(&proof.leaf),
                path: proof.path.iter().map(|(h, right)| (hashing::to_hex(h), *right)).collect(),
                peak_index: proof.peak_index,
                other_peaks: proof
                    .other_peaks
                    .iter()
                    .map(|(i, h)| (*i, hashing::to_hex(h)))
                    .collect(),
            },
        });
    }
    Ok(Json(entries))
}

fn rate_limit_by_ip(state: &ExecutorServerState, ip: IpAddr) -> Result<(), ExecutorError> {
    state
        .proof_rate_limiter
        .check_key(&ip)
        .map_err(|_| ExecutorError::ServiceUnavailable("rate limit exceeded".to_string()))
}

// ---------------------------------------------------------------------------
// POST /v2/poc-batches/generated
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GeneratedArtifactsRequest {
    pub block_height: u64,
    pub public_key: String,
    pub node_id: String,
    pub artifacts: Vec<GeneratedArtifactDto>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedArtifactDto {
    pub nonce: i32,
    pub vector_b64: String,
}

pub async fn post_generated_artifacts(
    State(state): State<Arc<ExecutorServerState>>,
    Json(request): Json<GeneratedArtifactsRequest>,
) -> Result<(), ExecutorError> {
    require_v2(&state)?;
    let snapshot = state.phase_tracker.snapshot();
    if !commit_worker::domain::should_accept_generated_artifacts(&snapshot) {
        return Err(ExecutorError::ServiceUnavailable(
            "current phase does not accept generated artifacts".to_string(),
        ));
    }
    let stage_height = commit_worker::domain::current_stage_height(&snapshot);
    let mut accepted = 0u64;
    for artifact in request.artifacts {
        let vector = BASE64
            .decode(&artifact.vector_b64)
            .map_err(|_| ExecutorError::BadRequest("artifact vector is not valid base64".to_string()))?;
        state
            .artifact_store
            .submit(stage_height, ArtifactLeaf { nonce: artifact.nonce, vector })?;
        accepted += 1;
    }
    state.attribution_sink.record(stage_height, &request.node_id, accepted);
    let _ = request.block_height;
    let _ = request.public_key;
    Ok(())
}

// ---------------------------------------------------------------------------
// POST /v2/poc-batches/validated
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ValidatedArtifactsRequest {
    pub block_height: u64,
    pub public_key: String,
    pub n_total: u64,
    pub fraud_detected: bool,
}

pub async fn post_validated_artifacts(
    State(state): State<Arc<ExecutorServerState>>,
    Json(request): Json<ValidatedArtifactsRequest>,
) -> Result<(), ExecutorError> {
    require_v2(&state)?;
    let snapshot = state.phase_tracker.snapshot();
    if !commit_worker::domain::should_accept_validated_artifacts(&snapshot) {
        return Err(ExecutorError::ServiceUnavailable(
            "current phase does not accept validated artifacts".to_string(),
        ));
    }
    let validated_weight = if request.fraud_detected { 0 } else { request.n_total };
    let payload = serde_json::json!({
        "type": "validated_weight",
        "block_height": request.block_height,
        "public_key": request.public_key,
        "validated_weight": validated_weight,
    });
    state.message_client.enqueue(
        snapshot.block_height,
        ChainMessage { kind: MessageKind::PocValidationV2, merge_key: snapshot.block_height, payload },
    )?;
    Ok(())
}

fn require_v2(state: &ExecutorServerState) -> Result<(), ExecutorError> {
    if !state.v2_enabled {
        return Err(ExecutorError::ServiceUnavailable(
            "this deployment does not run PoC V2".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub block_height: u64,
    pub epoch_index: u64,
    pub phase: String,
}

pub async fn get_status(State(state): State<Arc<ExecutorServerState>>) -> Json<StatusResponse> {
    let snapshot = state.phase_tracker.snapshot();
    Json(StatusResponse {
        block_height: snapshot.block_height,
        epoch_index: snapshot.epoch.epoch_index,
        phase: format!("{:?}", snapshot.phase),
    })
}
