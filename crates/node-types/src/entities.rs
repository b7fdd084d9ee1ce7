//! # Core Domain Entities
//!
//! Worker/node records, PoC artifact leaves, payload keys, and the
//! transaction message kinds that flow through the batching pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A 32-byte hash (SHA-256 output throughout this workspace).
pub type Hash = [u8; 32];

/// A raw signature (scheme-dependent length, stored as a byte vec so the
/// chain client and executor server can carry Ed25519 or secp256k1 alike).
pub type Signature = Vec<u8>;

/// A bech32/hex chain address identifying a participant account.
pub type Address = String;

/// Epoch identifier: monotonic, non-negative.
pub type EpochId = u64;

/// Unique identifier of a single inference.
pub type InferenceId = String;

// =============================================================================
// WORKER / NODE MODEL (owned exclusively by node-broker, C5)
// =============================================================================

/// Supported hardware descriptor reported by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub device: String,
    pub vram_mb: u64,
}

/// Per-model arguments a worker is configured to serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: String,
    pub args: BTreeMap<String, String>,
}

/// Static registration data for an ML worker. Exclusively owned by the
/// broker; `node_num` is assigned once at registration and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub host: String,
    pub inference_segment: String,
    pub inference_port: u16,
    pub poc_segment: String,
    pub poc_port: u16,
    pub models: Vec<ModelConfig>,
    pub max_concurrent: u32,
    pub node_num: u64,
    pub hardware: Vec<HardwareInfo>,
}

/// Coarse operational status of a worker as observed by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    Unknown,
    Inference,
    PoC,
    Stopped,
    Failed,
}

/// Sub-status while a worker is in the PoC phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PocSubStatus {
    Idle,
    Generating,
    Validating,
}

/// The ML-worker's own self-reported coarse state, polled via `/api/v1/state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteWorkerState {
    Stopped,
    Inference,
    Pow,
}

/// Record of the last time admin toggled participation for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminState {
    pub enabled: bool,
    pub epoch: EpochId,
}

/// The set of models/worker ids a node is authoritatively expected to
/// serve for the current epoch, as populated by the block dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochWorkerData {
    pub epoch_models: Vec<String>,
    pub epoch_mlnodes: Vec<String>,
}

/// Mutable runtime state tracked alongside a `Node` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub intended_status: WorkerStatus,
    pub current_status: WorkerStatus,
    pub poc_intended_status: PocSubStatus,
    pub poc_current_status: PocSubStatus,
    pub lock_count: u32,
    pub failure_reason: Option<String>,
    pub status_timestamp: u64,
    pub admin_state: AdminState,
    pub epoch_data: EpochWorkerData,
}

impl NodeState {
    pub fn new(now: u64) -> Self {
        Self {
            intended_status: WorkerStatus::Unknown,
            current_status: WorkerStatus::Unknown,
            poc_intended_status: PocSubStatus::Idle,
            poc_current_status: PocSubStatus::Idle,
            lock_count: 0,
            failure_reason: None,
            status_timestamp: now,
            admin_state: AdminState {
                enabled: true,
                epoch: 0,
            },
            epoch_data: EpochWorkerData::default(),
        }
    }
}

/// Outcome of a single FSM command run against a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub succeeded: bool,
    pub final_status: WorkerStatus,
    pub final_poc_status: PocSubStatus,
    pub original_target: String,
    pub error: Option<String>,
}

// =============================================================================
// POC ARTIFACT MODEL (owned by artifact-store, C1)
// =============================================================================

/// A single `(nonce, vector)` leaf appended to a stage's artifact log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactLeaf {
    pub nonce: i32,
    pub vector: Vec<u8>,
}

/// PoC artifact callback payload from the V2 ML-worker endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBatch {
    pub block_height: u64,
    pub public_key: String,
    pub node_id: String,
    pub artifacts: Vec<ArtifactLeaf>,
}

// =============================================================================
// PAYLOAD MODEL (owned by payload-store, C2)
// =============================================================================

/// Key identifying a stored `(prompt, response)` payload pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadKey {
    pub epoch_id: EpochId,
    pub inference_id: InferenceId,
}

/// A stored inference payload with its commitments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub prompt_payload: Vec<u8>,
    pub response_payload: Vec<u8>,
    pub prompt_hash: Hash,
    pub response_hash: Hash,
    pub created_at: u64,
}

// =============================================================================
// TRANSACTION BATCHING MODEL (owned by chain-client, C4)
// =============================================================================

/// The batchable chain message kinds recognized by the tx dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    StartInference,
    FinishInference,
    PocBatch,
    PocValidation,
    PocValidationV2,
}

impl MessageKind {
    pub const ALL: [MessageKind; 5] = [
        MessageKind::StartInference,
        MessageKind::FinishInference,
        MessageKind::PocBatch,
        MessageKind::PocValidation,
        MessageKind::PocValidationV2,
    ];

    /// Message type URL used to look up the per-kind block deadline.
    pub fn type_url(self) -> &'static str {
        match self {
            MessageKind::StartInference => "/inference.MsgStartInference",
            MessageKind::FinishInference => "/inference.MsgFinishInference",
            MessageKind::PocBatch => "/inference.MsgSubmitPocBatch",
            MessageKind::PocValidation => "/inference.MsgSubmitPocValidation",
            MessageKind::PocValidationV2 => "/inference.MsgSubmitPocValidationsV2",
        }
    }
}

/// An opaque, already-signable chain message queued for batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainMessage {
    pub kind: MessageKind,
    /// Height at which messages sharing this key should be merged
    /// (used only by `PocValidationV2`; `0` otherwise).
    pub merge_key: u64,
    pub payload: serde_json::Value,
}
