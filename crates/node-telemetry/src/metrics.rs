//! Prometheus metrics for the inference node's components.
//!
//! All metrics follow the naming convention: `node_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., artifacts_submitted_total)
//! - **Gauge**: Value that can go up or down (e.g., mempool_size)
//! - **Histogram**: Distribution of values (e.g., replay_scoring_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ARTIFACT STORE METRICS (C1)
    // =========================================================================

    /// Total artifact leaves submitted to the per-stage MMR
    pub static ref ARTIFACTS_SUBMITTED: Counter = Counter::new(
        "node_artifact_store_leaves_submitted_total",
        "Total number of PoC artifact leaves appended to the store"
    ).expect("metric creation failed");

    /// Artifact proof construction duration
    pub static ref PROOF_BUILD_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "node_artifact_store_proof_build_duration_seconds",
            "Time spent constructing a Merkle proof"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    /// Stages currently retained in memory
    pub static ref ARTIFACT_STAGES_RETAINED: Gauge = Gauge::new(
        "node_artifact_store_stages_retained",
        "Number of PoC stages currently retained by the artifact store"
    ).expect("metric creation failed");

    // =========================================================================
    // PAYLOAD STORE METRICS (C2)
    // =========================================================================

    /// Total payloads written
    pub static ref PAYLOADS_WRITTEN: Counter = Counter::new(
        "node_payload_store_writes_total",
        "Total number of inference payloads written to storage"
    ).expect("metric creation failed");

    /// Payload cache hit/miss counter
    pub static ref PAYLOAD_CACHE_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("node_payload_store_cache_lookups_total", "Payload read-cache lookups"),
        &["outcome"]  // outcome: hit/miss
    ).expect("metric creation failed");

    /// Durable backend write duration
    pub static ref PAYLOAD_WRITE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "node_payload_store_write_duration_seconds",
            "Time spent writing a payload to the durable backend"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // PHASE TRACKER METRICS (C3)
    // =========================================================================

    /// Current epoch height as observed by the phase tracker
    pub static ref CURRENT_EPOCH_HEIGHT: Gauge = Gauge::new(
        "node_phase_tracker_epoch_height",
        "Block height of the current epoch as seen by the phase tracker"
    ).expect("metric creation failed");

    /// Phase transitions observed
    pub static ref PHASE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("node_phase_tracker_transitions_total", "Phase transitions observed"),
        &["phase"]
    ).expect("metric creation failed");

    // =========================================================================
    // CHAIN CLIENT METRICS (C4)
    // =========================================================================

    /// Messages enqueued for batching, by kind
    pub static ref CHAIN_MESSAGES_ENQUEUED: CounterVec = CounterVec::new(
        Opts::new("node_chain_client_messages_enqueued_total", "Chain messages enqueued for batching"),
        &["kind"]
    ).expect("metric creation failed");

    /// Batches flushed to the chain RPC
    pub static ref CHAIN_BATCHES_FLUSHED: CounterVec = CounterVec::new(
        Opts::new("node_chain_client_batches_flushed_total", "Chain message batches submitted"),
        &["kind", "outcome"]  // outcome: acked/retried
    ).expect("metric creation failed");

    // =========================================================================
    // NODE BROKER METRICS (C5)
    // =========================================================================

    /// Worker lock acquisitions
    pub static ref BROKER_LOCKS_ACQUIRED: Counter = Counter::new(
        "node_broker_locks_acquired_total",
        "Total number of worker leases acquired by the broker"
    ).expect("metric creation failed");

    /// Healthy workers currently registered, by model
    pub static ref BROKER_HEALTHY_WORKERS: Gauge = Gauge::new(
        "node_broker_healthy_workers",
        "Number of workers currently in a non-failed, non-stopped state"
    ).expect("metric creation failed");

    /// Broker command outcomes
    pub static ref BROKER_COMMANDS: CounterVec = CounterVec::new(
        Opts::new("node_broker_commands_total", "Broker commands processed"),
        &["command", "outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // COMMIT WORKER METRICS (C6)
    // =========================================================================

    /// Store commits submitted to chain
    pub static ref STORE_COMMITS_SUBMITTED: Counter = Counter::new(
        "node_commit_worker_store_commits_total",
        "Total number of PoC store-root commits submitted"
    ).expect("metric creation failed");

    /// Weight distributions published
    pub static ref WEIGHT_DISTRIBUTIONS_PUBLISHED: Counter = Counter::new(
        "node_commit_worker_weight_distributions_total",
        "Total number of per-node weight distributions published"
    ).expect("metric creation failed");

    // =========================================================================
    // EXECUTOR SERVER METRICS (C7/C9)
    // =========================================================================

    /// HTTP requests served, by route and status class
    pub static ref EXECUTOR_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("node_executor_server_requests_total", "Executor server HTTP requests"),
        &["route", "status"]
    ).expect("metric creation failed");

    /// Requests rejected by the rate limiter
    pub static ref EXECUTOR_RATE_LIMITED: Counter = Counter::new(
        "node_executor_server_rate_limited_total",
        "Requests rejected by the per-IP rate limiter"
    ).expect("metric creation failed");

    /// Authz cache lookups
    pub static ref AUTHZ_CACHE_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("node_executor_server_authz_cache_lookups_total", "Authz grant cache lookups"),
        &["outcome"]  // outcome: hit/miss
    ).expect("metric creation failed");

    // =========================================================================
    // VALIDATOR METRICS (C8)
    // =========================================================================

    /// Inferences sampled for revalidation
    pub static ref INFERENCES_SAMPLED: Counter = Counter::new(
        "node_validator_inferences_sampled_total",
        "Total number of inferences selected for revalidation"
    ).expect("metric creation failed");

    /// Replay scoring outcomes
    pub static ref VALIDATION_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("node_validator_outcomes_total", "Validation outcomes by result"),
        &["outcome"]  // outcome: successful/failed/error
    ).expect("metric creation failed");

    /// Replay scoring duration
    pub static ref REPLAY_SCORING_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "node_validator_replay_scoring_duration_seconds",
            "Time spent scoring a replayed inference against the original logits"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Component errors by type
    pub static ref COMPONENT_ERRORS: CounterVec = CounterVec::new(
        Opts::new("node_component_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the metrics server
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Artifact store
        Box::new(ARTIFACTS_SUBMITTED.clone()),
        Box::new(PROOF_BUILD_DURATION.clone()),
        Box::new(ARTIFACT_STAGES_RETAINED.clone()),
        // Payload store
        Box::new(PAYLOADS_WRITTEN.clone()),
        Box::new(PAYLOAD_CACHE_LOOKUPS.clone()),
        Box::new(PAYLOAD_WRITE_DURATION.clone()),
        // Phase tracker
        Box::new(CURRENT_EPOCH_HEIGHT.clone()),
        Box::new(PHASE_TRANSITIONS.clone()),
        // Chain client
        Box::new(CHAIN_MESSAGES_ENQUEUED.clone()),
        Box::new(CHAIN_BATCHES_FLUSHED.clone()),
        // Node broker
        Box::new(BROKER_LOCKS_ACQUIRED.clone()),
        Box::new(BROKER_HEALTHY_WORKERS.clone()),
        Box::new(BROKER_COMMANDS.clone()),
        // Commit worker
        Box::new(STORE_COMMITS_SUBMITTED.clone()),
        Box::new(WEIGHT_DISTRIBUTIONS_PUBLISHED.clone()),
        // Executor server
        Box::new(EXECUTOR_REQUESTS.clone()),
        Box::new(EXECUTOR_RATE_LIMITED.clone()),
        Box::new(AUTHZ_CACHE_LOOKUPS.clone()),
        // Validator
        Box::new(INFERENCES_SAMPLED.clone()),
        Box::new(VALIDATION_OUTCOMES.clone()),
        Box::new(REPLAY_SCORING_DURATION.clone()),
        // Errors
        Box::new(COMPONENT_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // Create a new registry for testing
        let result = register_metrics();
        // May fail if already registered, which is fine
        let _ = result;
    }

    #[test]
    fn test_counter_increment() {
        ARTIFACTS_SUBMITTED.inc();
        assert!(ARTIFACTS_SUBMITTED.get() >= 1.0);
    }

    #[test]
    fn test_gauge_set() {
        CURRENT_EPOCH_HEIGHT.set(42.0);
        assert_eq!(CURRENT_EPOCH_HEIGHT.get(), 42.0);
    }

    #[test]
    fn test_histogram_timer() {
        let _timer = HistogramTimer::new(&REPLAY_SCORING_DURATION);
        std::thread::sleep(std::time::Duration::from_millis(1));
        // Timer observes on drop
    }
}
