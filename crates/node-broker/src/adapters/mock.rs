//! In-memory `WorkerTransport` used by tests and as a local default until
//! a real HTTP client lands behind this port.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use node_types::{Node, PocSubStatus, RemoteWorkerState};

use crate::domain::BrokerError;
use crate::ports::outbound::WorkerTransport;

#[derive(Default)]
pub struct MockWorkerTransport {
    states: Mutex<HashMap<String, (RemoteWorkerState, PocSubStatus)>>,
}

impl MockWorkerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, node_id: &str, state: RemoteWorkerState, sub: PocSubStatus) {
        self.states.lock().insert(node_id.to_string(), (state, sub));
    }
}

#[async_trait]
impl WorkerTransport for MockWorkerTransport {
    async fn query_state(
        &self,
        node: &Node,
    ) -> Result<(RemoteWorkerState, PocSubStatus), BrokerError> {
        Ok(self
            .states
            .lock()
            .get(&node.id)
            .copied()
            .unwrap_or((RemoteWorkerState::Stopped, PocSubStatus::Idle)))
    }

    async fn stop(&self, node: &Node) -> Result<(), BrokerError> {
        self.set_state(&node.id, RemoteWorkerState::Stopped, PocSubStatus::Idle);
        Ok(())
    }

    async fn init_generate_v1(&self, node: &Node) -> Result<(), BrokerError> {
        self.set_state(&node.id, RemoteWorkerState::Pow, PocSubStatus::Generating);
        Ok(())
    }

    async fn init_validate_v1(&self, node: &Node) -> Result<(), BrokerError> {
        self.set_state(&node.id, RemoteWorkerState::Pow, PocSubStatus::Validating);
        Ok(())
    }

    async fn init_generate_v2(&self, node: &Node) -> Result<(), BrokerError> {
        self.init_generate_v1(node).await
    }

    async fn init_validate_v2(&self, node: &Node) -> Result<(), BrokerError> {
        self.init_validate_v1(node).await
    }

    async fn init_inference(&self, node: &Node) -> Result<(), BrokerError> {
        self.set_state(&node.id, RemoteWorkerState::Inference, PocSubStatus::Idle);
        Ok(())
    }
}
