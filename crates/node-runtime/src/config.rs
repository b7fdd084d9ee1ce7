//! Runtime configuration: wraps [`node_types::NodeConfig`] with the
//! handful of knobs that belong to the runtime's own wiring rather than to
//! any one component — the epoch shape, which models a locally leased
//! worker can serve, and the identity this process validates and commits
//! under.

use std::collections::HashSet;
use std::time::Duration;

use node_types::{Epoch, NodeConfig};

/// Top-level configuration for the `node-runtime` binary, loaded once at
/// startup and shared read-only by every spawned task.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub node: NodeConfig,
    pub epoch: Epoch,
    pub known_models: HashSet<String>,
    pub validator_address: String,
    pub validator_model_id: String,
    pub v2_enabled: bool,
    pub payload_ttl: Duration,
    /// Interval between synthetic block-height advances. There is no real
    /// chain connection behind [`chain_client::ports::outbound::ChainRpc`]
    /// yet (see the workspace's mock-only stance on external-boundary
    /// ports), so this runtime drives its own phase progression locally.
    pub block_tick_interval: Duration,
    pub sampling_interval: Duration,
}

impl RuntimeConfig {
    /// Load from the environment, falling back to defaults for anything
    /// unset. Mirrors [`NodeConfig::from_env`]'s never-fail contract.
    pub fn from_env() -> Self {
        let epoch = Epoch {
            epoch_index: 0,
            start_block_height: 0,
            poc_start_block_height: env_u64("NODE_POC_START_HEIGHT", 200),
            epoch_length: env_u64("NODE_EPOCH_LENGTH", 1_000),
            poc_stage_duration: env_u64("NODE_POC_STAGE_DURATION", 50),
            wind_down_blocks: env_u64("NODE_POC_WIND_DOWN_BLOCKS", 10),
        };

        let known_models: HashSet<String> = std::env::var("NODE_KNOWN_MODELS")
            .unwrap_or_else(|_| "llama-3".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            node: NodeConfig::from_env(),
            epoch,
            known_models,
            validator_address: env_or("NODE_VALIDATOR_ADDRESS", "validator-local"),
            validator_model_id: env_or("NODE_VALIDATOR_MODEL_ID", "llama-3"),
            v2_enabled: env_bool("NODE_POCV2_ENABLED", true),
            payload_ttl: Duration::from_secs(env_u64("NODE_PAYLOAD_TTL_SECS", 3_600)),
            block_tick_interval: Duration::from_millis(env_u64("NODE_BLOCK_TICK_MS", 2_000)),
            sampling_interval: Duration::from_millis(env_u64("NODE_SAMPLING_INTERVAL_MS", 5_000)),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_without_environment() {
        let config = RuntimeConfig::from_env();
        assert!(config.known_models.contains("llama-3"));
        assert!(config.block_tick_interval.as_millis() > 0);
    }
}
