//! # Node Configuration
//!
//! Loaded once at startup from environment variables (with defaults), then
//! shared by `Arc<NodeConfig>` across every component. Nothing here is
//! reloaded at runtime; a restart is required to pick up new values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entities::MessageKind;

/// Per-message-kind block deadline: how many blocks a queued message is
/// allowed to wait for a batch flush before it is treated as overdue and
/// force-flushed on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxDeadlineTable {
    default_blocks: u64,
    overrides: BTreeMap<String, u64>,
}

impl TxDeadlineTable {
    pub fn deadline_blocks(&self, kind: MessageKind) -> u64 {
        self.overrides
            .get(kind.type_url())
            .copied()
            .unwrap_or(self.default_blocks)
    }
}

impl Default for TxDeadlineTable {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert(MessageKind::PocBatch.type_url().to_string(), 240);
        overrides.insert(MessageKind::PocValidation.type_url().to_string(), 240);
        overrides.insert(MessageKind::PocValidationV2.type_url().to_string(), 240);
        overrides.insert(MessageKind::StartInference.type_url().to_string(), 150);
        overrides.insert(MessageKind::FinishInference.type_url().to_string(), 150);
        Self {
            default_blocks: 30,
            overrides,
        }
    }
}

/// Connection parameters for the chain RPC/gRPC endpoint and the local
/// validator-signing account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConnectionConfig {
    pub rpc_endpoint: String,
    pub grpc_endpoint: String,
    pub signer_address: String,
    pub retry_interval: Duration,
}

impl Default for ChainConnectionConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: env_or("CHAIN_RPC_ENDPOINT", "http://127.0.0.1:26657"),
            grpc_endpoint: env_or("CHAIN_GRPC_ENDPOINT", "http://127.0.0.1:9090"),
            signer_address: env_or("CHAIN_SIGNER_ADDRESS", ""),
            retry_interval: Duration::from_secs(env_u64("PG_RETRY_INTERVAL", 240)),
        }
    }
}

/// Storage roots and retention knobs for the on-disk stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
    pub artifact_retain_stages: usize,
    pub payload_flush_timeout: Duration,
    pub durable_stream_dir: PathBuf,
    /// How many of the most recent epochs the payload store's background
    /// loop keeps before auto-pruning older ones.
    pub payload_retain_epochs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base_dir = PathBuf::from(env_or("TESTNET_BASE_DIR", "./data"));
        Self {
            durable_stream_dir: base_dir.join("durable-stream"),
            base_dir,
            artifact_retain_stages: 3,
            payload_flush_timeout: Duration::from_secs(30),
            payload_retain_epochs: env_u64("NODE_PAYLOAD_RETAIN_EPOCHS", 5),
        }
    }
}

/// Top-level node configuration, assembled once at process startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub chain: ChainConnectionConfig,
    pub storage: StorageConfig,
    pub tx_deadlines: TxDeadlineTable,
    /// How often the chain client re-attempts a failed batch distribution.
    pub distribution_retry_interval: Duration,
    /// Window during which an unacknowledged submitted batch is held
    /// in-flight before it is considered lost and retried.
    pub ack_window: Duration,
    pub listen_addr: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain: ChainConnectionConfig::default(),
            storage: StorageConfig::default(),
            tx_deadlines: TxDeadlineTable::default(),
            distribution_retry_interval: Duration::from_secs(30),
            ack_window: Duration::from_secs(60),
            listen_addr: env_or("LISTEN_ADDR", "0.0.0.0:8080"),
        }
    }
}

impl NodeConfig {
    /// Load from the environment, falling back to defaults for anything
    /// unset. Never fails: missing/invalid values degrade to defaults
    /// rather than aborting startup, since most are genuinely optional.
    pub fn from_env() -> Self {
        Self::default()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_table_falls_back_to_default() {
        let table = TxDeadlineTable::default();
        assert_eq!(table.deadline_blocks(MessageKind::PocBatch), 240);
        assert_eq!(table.deadline_blocks(MessageKind::StartInference), 150);
    }

    #[test]
    fn default_config_builds() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.tx_deadlines.deadline_blocks(MessageKind::PocBatch), 240);
        assert!(cfg.ack_window.as_secs() > 0);
    }
}
