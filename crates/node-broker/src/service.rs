//! `NodeBrokerService`: owns the worker registry and, for every
//! registered node, a single-consumer command queue that serializes FSM
//! transitions against that node's ML-worker.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use node_types::{
    CommandResult, HardwareInfo, Node, NodeState, PocSubStatus, RemoteWorkerState, WorkerStatus,
};

use crate::domain::{validate_node, BrokerError, NodeCommand};
use crate::ports::inbound::NodeBroker;
use crate::ports::outbound::WorkerTransport;

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

struct Entry {
    node: Node,
    state: NodeState,
}

struct WorkerHandle {
    tx: mpsc::Sender<(NodeCommand, oneshot::Sender<CommandResult>)>,
    task: tokio::task::JoinHandle<()>,
}

pub struct NodeBrokerService<T: WorkerTransport + 'static> {
    transport: Arc<T>,
    known_models: RwLock<HashSet<String>>,
    registry: RwLock<HashMap<String, Arc<RwLock<Entry>>>>,
    workers: RwLock<HashMap<String, WorkerHandle>>,
    next_node_num: AtomicU64,
}

impl<T: WorkerTransport + 'static> NodeBrokerService<T> {
    pub fn new(transport: Arc<T>, known_models: HashSet<String>) -> Self {
        Self {
            transport,
            known_models: RwLock::new(known_models),
            registry: RwLock::new(HashMap::new()),
            workers: RwLock::new(HashMap::new()),
            next_node_num: AtomicU64::new(1),
        }
    }

    pub fn set_known_models(&self, models: HashSet<String>) {
        *self.known_models.write() = models;
    }

    fn spawn_worker(&self, id: &str, entry: Arc<RwLock<Entry>>) {
        let (tx, mut rx) = mpsc::channel::<(NodeCommand, oneshot::Sender<CommandResult>)>(32);
        let transport = self.transport.clone();
        let task = tokio::spawn(async move {
            while let Some((cmd, respond)) = rx.recv().await {
                let result = execute(&entry, transport.as_ref(), cmd).await;
                let _ = respond.send(result);
            }
        });
        self.workers
            .write()
            .insert(id.to_string(), WorkerHandle { tx, task });
    }

    async fn dispatch(&self, id: &str, cmd: NodeCommand) -> Result<CommandResult, BrokerError> {
        let tx = {
            let workers = self.workers.read();
            workers
                .get(id)
                .map(|w| w.tx.clone())
                .ok_or_else(|| BrokerError::NotFound(id.to_string()))?
        };
        let (respond, recv) = oneshot::channel();
        tx.send((cmd, respond))
            .await
            .map_err(|_| BrokerError::ContextCanceled)?;
        recv.await.map_err(|_| BrokerError::ContextCanceled)
    }

    /// Select a healthy worker serving `model`, run `f` on a snapshot of it
    /// under a scoped lease, and release the lease on return.
    pub fn lock_node<F, R>(&self, model: &str, f: F) -> Result<R, BrokerError>
    where
        F: FnOnce(&Node) -> R,
    {
        let node = self.select_and_lease(model)?;
        let result = f(&node);
        self.release_lease(&node.id);
        Ok(result)
    }

    /// Async counterpart of [`Self::lock_node`] for callers whose work
    /// against the leased worker suspends (an HTTP replay call). The lease
    /// must be released with [`Self::release_lease`] using the returned
    /// node's id, even on an error path.
    pub fn begin_lease(&self, model: &str) -> Result<Node, BrokerError> {
        self.select_and_lease(model)
    }

    pub fn release_lease(&self, node_id: &str) {
        if let Some(entry) = self.registry.read().get(node_id) {
            let mut g = entry.write();
            g.state.lock_count = g.state.lock_count.saturating_sub(1);
        }
    }

    fn select_and_lease(&self, model: &str) -> Result<Node, BrokerError> {
        let registry = self.registry.read();
        let candidate = registry
            .values()
            .filter(|e| {
                let g = e.read();
                g.state.current_status != WorkerStatus::Failed
                    && g.state.current_status != WorkerStatus::Stopped
                    && g.node.models.iter().any(|m| m.model_id == model)
            })
            .min_by_key(|e| e.read().state.lock_count)
            .cloned();
        drop(registry);

        let entry = candidate.ok_or(BrokerError::NoNodesAvailable)?;
        let mut g = entry.write();
        g.state.lock_count += 1;
        Ok(g.node.clone())
    }
}

async fn execute(
    entry: &Arc<RwLock<Entry>>,
    transport: &dyn WorkerTransport,
    cmd: NodeCommand,
) -> CommandResult {
    let node = entry.read().node.clone();
    let id = node.id.clone();

    let outcome: Result<(WorkerStatus, PocSubStatus), BrokerError> = match cmd {
        NodeCommand::StatusQuery => transport
            .query_state(&node)
            .await
            .map(|(remote, sub)| (map_remote_status(remote), sub)),

        NodeCommand::StartPoC { v2 } => {
            let (remote, sub) = match transport.query_state(&node).await {
                Ok(s) => s,
                Err(e) => return failure(&node, entry, e),
            };
            if remote == RemoteWorkerState::Pow && sub == PocSubStatus::Generating {
                Ok((WorkerStatus::PoC, PocSubStatus::Generating))
            } else {
                if !v2 && remote != RemoteWorkerState::Stopped {
                    if let Err(e) = transport.stop(&node).await {
                        return failure(&node, entry, e);
                    }
                }
                let call = if v2 {
                    transport.init_generate_v2(&node).await
                } else {
                    transport.init_generate_v1(&node).await
                };
                call.map(|_| (WorkerStatus::PoC, PocSubStatus::Generating))
            }
        }

        NodeCommand::InitValidate { v2 } => {
            let (remote, sub) = match transport.query_state(&node).await {
                Ok(s) => s,
                Err(e) => return failure(&node, entry, e),
            };
            if remote == RemoteWorkerState::Pow && sub == PocSubStatus::Validating {
                Ok((WorkerStatus::PoC, PocSubStatus::Validating))
            } else {
                if !v2 && remote != RemoteWorkerState::Stopped && remote != RemoteWorkerState::Pow
                {
                    if let Err(e) = transport.stop(&node).await {
                        return failure(&node, entry, e);
                    }
                }
                let call = if v2 {
                    transport.init_validate_v2(&node).await
                } else {
                    transport.init_validate_v1(&node).await
                };
                call.map(|_| (WorkerStatus::PoC, PocSubStatus::Validating))
            }
        }

        NodeCommand::StopNode => transport
            .stop(&node)
            .await
            .map(|_| (WorkerStatus::Stopped, PocSubStatus::Idle)),

        NodeCommand::InitInference => transport
            .init_inference(&node)
            .await
            .map(|_| (WorkerStatus::Inference, PocSubStatus::Idle)),
    };

    match outcome {
        Ok((status, poc_status)) => {
            let mut g = entry.write();
            g.state.current_status = status;
            g.state.poc_current_status = poc_status;
            g.state.failure_reason = None;
            g.state.status_timestamp = now_unix();
            CommandResult {
                succeeded: true,
                final_status: status,
                final_poc_status: poc_status,
                original_target: id,
                error: None,
            }
        }
        Err(e) => failure(&node, entry, e),
    }
}

fn failure(node: &Node, entry: &Arc<RwLock<Entry>>, err: BrokerError) -> CommandResult {
    let mut g = entry.write();
    g.state.current_status = WorkerStatus::Failed;
    g.state.failure_reason = Some(err.to_string());
    g.state.status_timestamp = now_unix();
    CommandResult {
        succeeded: false,
        final_status: WorkerStatus::Failed,
        final_poc_status: g.state.poc_current_status,
        original_target: node.id.clone(),
        error: Some(err.to_string()),
    }
}

fn map_remote_status(remote: RemoteWorkerState) -> WorkerStatus {
    match remote {
        RemoteWorkerState::Stopped => WorkerStatus::Stopped,
        RemoteWorkerState::Inference => WorkerStatus::Inference,
        RemoteWorkerState::Pow => WorkerStatus::PoC,
    }
}

#[async_trait]
impl<T: WorkerTransport + 'static> NodeBroker for NodeBrokerService<T> {
    async fn register_node(&self, mut node: Node) -> Result<Node, BrokerError> {
        let known = self.known_models.read().clone();
        {
            let registry = self.registry.read();
            let existing: Vec<Node> = registry.values().map(|e| e.read().node.clone()).collect();
            let existing_refs: Vec<&Node> = existing.iter().collect();
            validate_node(&node, &existing_refs, &known).map_err(BrokerError::Validation)?;
        }

        let node_num = self.next_node_num.fetch_add(1, Ordering::Relaxed);
        node.node_num = node_num;
        let entry = Arc::new(RwLock::new(Entry {
            node: node.clone(),
            state: NodeState::new(now_unix()),
        }));
        self.registry.write().insert(node.id.clone(), entry.clone());
        self.spawn_worker(&node.id, entry);
        let _ = self.dispatch(&node.id, NodeCommand::StatusQuery).await;
        Ok(node)
    }

    async fn update_node(&self, mut node: Node) -> Result<Node, BrokerError> {
        let known = self.known_models.read().clone();
        let preserved_node_num = {
            let registry = self.registry.read();
            let current = registry
                .get(&node.id)
                .ok_or_else(|| BrokerError::NotFound(node.id.clone()))?;
            let existing: Vec<Node> = registry
                .values()
                .map(|e| e.read().node.clone())
                .collect();
            let existing_refs: Vec<&Node> = existing.iter().collect();
            validate_node(&node, &existing_refs, &known).map_err(BrokerError::Validation)?;
            let node_num = current.read().node.node_num;
            node_num
        };
        node.node_num = preserved_node_num;

        {
            let registry = self.registry.read();
            let entry = registry
                .get(&node.id)
                .ok_or_else(|| BrokerError::NotFound(node.id.clone()))?;
            entry.write().node = node.clone();
        }
        let _ = self.dispatch(&node.id, NodeCommand::StatusQuery).await;
        Ok(node)
    }

    /// Stops new commands from reaching this node immediately (the
    /// handle is gone from `workers` before this returns), then waits
    /// for whatever was already queued to finish running against the
    /// transport before dropping the node from the registry.
    async fn remove_node(&self, id: &str) -> Result<(), BrokerError> {
        let handle = self
            .workers
            .write()
            .remove(id)
            .ok_or_else(|| BrokerError::NotFound(id.to_string()))?;
        drop(handle.tx);
        let _ = handle.task.await;
        self.registry.write().remove(id);
        Ok(())
    }

    async fn set_admin_state(&self, id: &str, enabled: bool, epoch: u64) -> Result<(), BrokerError> {
        let registry = self.registry.read();
        let entry = registry
            .get(id)
            .ok_or_else(|| BrokerError::NotFound(id.to_string()))?;
        let mut g = entry.write();
        g.state.admin_state.enabled = enabled;
        g.state.admin_state.epoch = epoch;
        Ok(())
    }

    async fn update_hardware(&self, id: &str, hardware: Vec<HardwareInfo>) -> Result<(), BrokerError> {
        let registry = self.registry.read();
        let entry = registry
            .get(id)
            .ok_or_else(|| BrokerError::NotFound(id.to_string()))?;
        entry.write().node.hardware = hardware;
        Ok(())
    }

    async fn start_poc(&self, id: &str, v2: bool) -> Result<CommandResult, BrokerError> {
        self.dispatch(id, NodeCommand::StartPoC { v2 }).await
    }

    async fn init_validate(&self, id: &str, v2: bool) -> Result<CommandResult, BrokerError> {
        self.dispatch(id, NodeCommand::InitValidate { v2 }).await
    }

    async fn stop_node(&self, id: &str) -> Result<CommandResult, BrokerError> {
        self.dispatch(id, NodeCommand::StopNode).await
    }

    async fn init_inference(&self, id: &str) -> Result<CommandResult, BrokerError> {
        self.dispatch(id, NodeCommand::InitInference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockWorkerTransport;
    use node_types::ModelConfig;
    use std::collections::BTreeMap;

    fn broker() -> NodeBrokerService<MockWorkerTransport> {
        NodeBrokerService::new(
            Arc::new(MockWorkerTransport::new()),
            HashSet::from(["llama-3".to_string()]),
        )
    }

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            host: "worker.example.com".to_string(),
            inference_segment: "/v1".to_string(),
            inference_port: 8000,
            poc_segment: "/poc".to_string(),
            poc_port: 8001,
            models: vec![ModelConfig { model_id: "llama-3".to_string(), args: BTreeMap::new() }],
            max_concurrent: 4,
            node_num: 0,
            hardware: Vec::new(),
        }
    }

    #[tokio::test]
    async fn register_assigns_monotonic_node_num() {
        let broker = broker();
        let a = broker.register_node(node("a")).await.unwrap();
        let b = broker.register_node(node("b").tap_host("worker2.example.com")).await.unwrap();
        assert_eq!(a.node_num, 1);
        assert_eq!(b.node_num, 2);
    }

    #[tokio::test]
    async fn register_rejects_ssrf_host() {
        let broker = broker();
        let mut n = node("a");
        n.host = "127.0.0.1".to_string();
        assert!(broker.register_node(n).await.is_err());
    }

    #[tokio::test]
    async fn start_poc_v1_is_idempotent_when_already_generating() {
        let broker = broker();
        let registered = broker.register_node(node("a")).await.unwrap();
        let result = broker.start_poc(&registered.id, false).await.unwrap();
        assert!(result.succeeded);
        assert_eq!(result.final_poc_status, PocSubStatus::Generating);

        let second = broker.start_poc(&registered.id, false).await.unwrap();
        assert!(second.succeeded);
        assert_eq!(second.final_poc_status, PocSubStatus::Generating);
    }

    #[tokio::test]
    async fn lock_node_fails_when_no_matching_model() {
        let broker = broker();
        broker.register_node(node("a")).await.unwrap();
        let result = broker.lock_node("unknown-model", |_n| 1);
        assert!(matches!(result, Err(BrokerError::NoNodesAvailable)));
    }

    #[tokio::test]
    async fn begin_lease_then_release_restores_lock_count() {
        let broker = broker();
        broker.register_node(node("a")).await.unwrap();
        let leased = broker.begin_lease("llama-3").unwrap();
        assert_eq!(leased.id, "a");
        // A second lease call picks a different node if one is free; here
        // there is only one, so it still succeeds (lock_count just grows).
        assert!(broker.begin_lease("llama-3").is_ok());
        broker.release_lease(&leased.id);
        broker.release_lease(&leased.id);
    }

    #[tokio::test]
    async fn lock_node_runs_closure_against_matching_worker() {
        let broker = broker();
        broker.register_node(node("a")).await.unwrap();
        let id = broker.lock_node("llama-3", |n| n.id.clone()).unwrap();
        assert_eq!(id, "a");
    }

    #[tokio::test]
    async fn remove_node_drains_already_queued_commands_instead_of_aborting_them() {
        let broker = Arc::new(broker());
        let registered = broker.register_node(node("a")).await.unwrap();

        // Queued concurrently with removal: whichever lands first, the
        // command must either run to completion against the transport or
        // be rejected as not-found — never come back as a canceled
        // result, since nothing marks in-flight commands canceled.
        let dispatcher = broker.clone();
        let id = registered.id.clone();
        let queued = tokio::spawn(async move { dispatcher.start_poc(&id, false).await });

        broker.remove_node(&registered.id).await.unwrap();

        match queued.await.unwrap() {
            Ok(result) => assert!(result.succeeded),
            Err(err) => assert!(matches!(err, BrokerError::NotFound(_))),
        }
        assert!(broker.lock_node("llama-3", |_n| ()).is_err());
    }

    #[tokio::test]
    async fn remove_node_on_unknown_id_errors() {
        let broker = broker();
        assert!(matches!(broker.remove_node("ghost").await, Err(BrokerError::NotFound(_))));
    }

    trait TestNodeExt {
        fn tap_host(self, host: &str) -> Self;
    }
    impl TestNodeExt for Node {
        fn tap_host(mut self, host: &str) -> Self {
            self.host = host.to_string();
            self
        }
    }
}
