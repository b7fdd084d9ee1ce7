//! # Container
//!
//! Owns one `Arc` of every real component and the background tasks that
//! drive them. Every external-boundary port (the chain RPC, the
//! ML-worker transport, the peer executor client, the worker replay
//! client) is wired to its mock/in-memory adapter — none of those has a
//! real network implementation in this workspace yet, matching
//! `node-broker`'s own stated stance that the mock transport is "the
//! local default until a real HTTP client lands behind this port".
//!
//! There is likewise no real chain connection, so block height is driven
//! by a synthetic ticker instead of a subscription to an external chain.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use artifact_store::adapters::FileArtifactLog;
use artifact_store::ports::inbound::ArtifactStorePort;
use artifact_store::ManagedArtifactStore;
use block_events::{BlockEvent, BlockEventBus, EventPublisher};
use chain_client::adapters::MockChainRpc;
use chain_client::ports::inbound::MessageClient;
use chain_client::ChainClientService;
use commit_worker::CommitWorker;
use durable_stream::{DurableLog, DurableStream};
use executor_server::adapters::MockChainQuery;
use executor_server::ExecutorServerState;
use node_broker::adapters::MockWorkerTransport;
use node_broker::ports::inbound::NodeBroker;
use node_broker::NodeBrokerService;
use node_crypto::Ed25519KeyPair;
use node_types::{ModelConfig, Node};
use payload_store::adapters::{DurableBackend, FileBackend, HybridBackend, NullDurableBackend};
use payload_store::ports::outbound::PayloadBackend;
use payload_store::ManagedPayloadStore;
use phase_tracker::{PhaseSnapshot, PhaseTracker};
use validator::adapters::mock::{MockExecutorClient, MockValidationChainQuery, MockWorkerReplayClient};
use validator::adapters::BrokerLease;
use validator::ports::outbound::ValidationChainQuery;
use validator::Validator;

use crate::attribution::AttributionTracker;
use crate::config::RuntimeConfig;

type PayloadStore = ManagedPayloadStore<HybridBackend<Box<dyn PayloadBackend>, FileBackend>>;
type ChainClient = ChainClientService<MockChainRpc>;
type Broker = NodeBrokerService<MockWorkerTransport>;
type Commit = CommitWorker<ManagedArtifactStore, ChainClient, AttributionTracker>;
type NodeValidator = Validator<
    MockValidationChainQuery,
    MockExecutorClient,
    MockWorkerReplayClient,
    BrokerLease<MockWorkerTransport>,
    ChainClient,
>;

/// Placeholder host passed to the validator's executor-client port. The
/// mock executor client ignores it; a real deployment would resolve this
/// per-inference from the broker registry once a real adapter exists.
const LOCAL_EXECUTOR_HOST: &str = "http://127.0.0.1:8090";

pub struct Container {
    pub config: RuntimeConfig,
    pub artifact_store: Arc<ManagedArtifactStore>,
    pub payload_store: Arc<PayloadStore>,
    pub phase_tracker: Arc<PhaseTracker>,
    pub block_bus: Arc<BlockEventBus>,
    pub chain_client: Arc<ChainClient>,
    pub broker: Arc<Broker>,
    pub attribution: Arc<AttributionTracker>,
    pub commit_worker: Arc<Commit>,
    pub executor_state: Arc<ExecutorServerState>,
    pub validator: Arc<NodeValidator>,
    pub chain_query: Arc<MockValidationChainQuery>,
    height: AtomicU64,
}

impl Container {
    pub async fn build(config: RuntimeConfig) -> Result<Self> {
        let artifact_log = FileArtifactLog::new(config.node.storage.base_dir.join("artifacts"))
            .context("opening artifact log")?;
        let artifact_store = Arc::new(ManagedArtifactStore::new(Arc::new(artifact_log)));

        let payload_fallback = FileBackend::new(config.node.storage.base_dir.join("payloads"))
            .context("opening payload backend")?;
        let payload_durable: Box<dyn PayloadBackend> = match std::env::var("PGHOST") {
            Ok(_) => Box::new(
                DurableBackend::open(config.node.storage.base_dir.join("payloads-durable"))
                    .context("opening durable payload backend")?,
            ),
            Err(_) => {
                tracing::info!("PGHOST unset, durable payload backend disabled");
                Box::new(NullDurableBackend)
            }
        };
        let payload_backend =
            HybridBackend::new(payload_durable, payload_fallback, config.node.chain.retry_interval);
        let payload_store = Arc::new(ManagedPayloadStore::new(payload_backend, config.payload_ttl));

        let phase_tracker = PhaseTracker::new(PhaseSnapshot::genesis(config.epoch));
        let block_bus = Arc::new(BlockEventBus::new(256));

        let durable_backend =
            durable_stream::adapters::RocksDurableLog::open(&config.node.storage.durable_stream_dir)
                .context("opening chain-client durable stream backend")?;
        let chain_durable: Arc<dyn DurableLog> = Arc::new(
            DurableStream::open(durable_backend).context("replaying chain-client durable stream")?,
        );
        let chain_rpc = Arc::new(MockChainRpc::new());
        let chain_client = Arc::new(
            ChainClientService::open(
                chain_rpc,
                chain_durable,
                config.node.tx_deadlines.clone(),
                config.node.ack_window,
            )
            .context("replaying chain client from durable stream")?,
        );

        let worker_transport = Arc::new(MockWorkerTransport::new());
        let broker = Arc::new(NodeBrokerService::new(worker_transport, config.known_models.clone()));
        register_local_worker(&broker, &config).await?;

        let attribution = AttributionTracker::new();
        let commit_worker = Arc::new(CommitWorker::new(
            phase_tracker.clone(),
            artifact_store.clone(),
            chain_client.clone(),
            attribution.clone(),
            config.node.distribution_retry_interval,
        ));

        let chain_query_x = Arc::new(MockChainQuery::new());
        let signing_key = Ed25519KeyPair::generate();
        let executor_state = Arc::new(ExecutorServerState::new(
            artifact_store.clone(),
            payload_store.clone(),
            phase_tracker.clone(),
            chain_client.clone(),
            chain_query_x,
            attribution.clone(),
            signing_key,
            config.v2_enabled,
        ));

        let chain_query_v = Arc::new(MockValidationChainQuery::new());
        let executor_client = Arc::new(MockExecutorClient::new());
        let worker_replay = Arc::new(MockWorkerReplayClient::new());
        let leasing = Arc::new(BrokerLease::new(broker.clone()));
        let validator = Arc::new(Validator::new(
            chain_query_v.clone(),
            executor_client,
            worker_replay,
            leasing,
            chain_client.clone(),
            config.validator_address.clone(),
            config.validator_model_id.clone(),
        ));

        Ok(Self {
            config,
            artifact_store,
            payload_store,
            phase_tracker,
            block_bus,
            chain_client,
            broker,
            attribution,
            commit_worker,
            executor_state,
            validator,
            chain_query: chain_query_v,
            height: AtomicU64::new(0),
        })
    }

    /// Spawn every background task and the HTTP server, all gated by
    /// `shutdown`. Returns once the server and phase tracker have both
    /// stopped.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let phase_task = tokio::spawn(self.phase_tracker.clone().run(self.block_bus.subscribe()));

        let ticker = self.clone();
        let mut ticker_shutdown = shutdown.resubscribe();
        let ticker_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(ticker.config.block_tick_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => ticker.advance_block(),
                    _ = ticker_shutdown.recv() => break,
                }
            }
        });

        let sampler = self.clone();
        let mut sampler_shutdown = shutdown.resubscribe();
        let sampling_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sampler.config.sampling_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => sampler.run_sampling_pass().await,
                    _ = sampler_shutdown.recv() => break,
                }
            }
        });

        let addr: SocketAddr = self
            .config
            .node
            .listen_addr
            .parse()
            .context("parsing listen address")?;
        let listener = tokio::net::TcpListener::bind(addr).await.context("binding listen address")?;
        let router = executor_server::build_router(self.executor_state.clone())
            .into_make_service_with_connect_info::<SocketAddr>();
        let mut server_shutdown = shutdown.resubscribe();
        let server_task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.recv().await;
                })
                .await
        });

        let _ = tokio::join!(phase_task, ticker_task, sampling_task, server_task);
        Ok(())
    }

    fn advance_block(&self) {
        let height = self.height.fetch_add(1, Ordering::Relaxed) + 1;
        let event = BlockEvent { height, epoch: self.config.epoch };
        self.block_bus.publish(event);
        self.chain_client.tick(height);
        self.commit_worker.tick(height);

        if height % 500 == 0 {
            self.artifact_store.prune(height.saturating_sub(500), self.config.node.storage.artifact_retain_stages);
            self.payload_store.prune_expired();
            self.payload_store.prune_epochs_before(
                self.phase_tracker.snapshot().epoch.epoch_index,
                self.config.node.storage.payload_retain_epochs,
            );
            self.attribution.prune(height.saturating_sub(500));
        }
    }

    async fn run_sampling_pass(&self) {
        let epoch_id = self.phase_tracker.snapshot().epoch.epoch_index;
        let inferences = match self.chain_query.list_inferences(epoch_id).await {
            Ok(inferences) => inferences,
            Err(e) => {
                tracing::warn!(error = %e, "sampling pass could not list inferences");
                return;
            }
        };
        let current_height = self.height.load(Ordering::Relaxed);
        for inference in inferences {
            match self
                .validator
                .consider_inference(epoch_id, &inference.inference_id, LOCAL_EXECUTOR_HOST, current_height)
                .await
            {
                Ok(Some(report)) => {
                    tracing::info!(
                        inference_id = %report.inference_id,
                        successful = report.outcome.is_successful(),
                        "validation report submitted"
                    );
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    inference_id = %inference.inference_id,
                    error = %e,
                    "validation pass failed"
                ),
            }
        }
    }
}

async fn register_local_worker(broker: &Arc<Broker>, config: &RuntimeConfig) -> Result<()> {
    let models = config
        .known_models
        .iter()
        .map(|model_id| ModelConfig { model_id: model_id.clone(), args: BTreeMap::new() })
        .collect();
    let node = Node {
        id: "local-worker-1".to_string(),
        host: "local-worker-1.workers.internal".to_string(),
        inference_segment: "/v1".to_string(),
        inference_port: 8100,
        poc_segment: "/poc".to_string(),
        poc_port: 8101,
        models,
        max_concurrent: 1,
        node_num: 0,
        hardware: Vec::new(),
    };
    broker.register_node(node).await.context("registering local worker")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn container_builds_with_default_config() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("TESTNET_BASE_DIR", dir.path());
        let config = RuntimeConfig::from_env();
        let container = Container::build(config).await.unwrap();
        assert_eq!(container.height.load(Ordering::Relaxed), 0);
        assert!(container.broker.lock_node("llama-3", |n| n.id.clone()).is_ok());
    }

    #[tokio::test]
    async fn advance_block_moves_chain_client_and_commit_worker_forward() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("TESTNET_BASE_DIR", dir.path());
        let config = RuntimeConfig::from_env();
        let container = Container::build(config).await.unwrap();
        container.advance_block();
        assert_eq!(container.height.load(Ordering::Relaxed), 1);
    }
}
