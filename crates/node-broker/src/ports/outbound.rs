//! Driven port: the ML-worker's own HTTP surface, abstracted so the FSM
//! guards can be tested without a network.

use async_trait::async_trait;
use node_types::{Node, PocSubStatus, RemoteWorkerState};

use crate::domain::BrokerError;

#[async_trait]
pub trait WorkerTransport: Send + Sync {
    /// Poll the worker's coarse state plus its PoC sub-state via `/api/v1/state`.
    async fn query_state(
        &self,
        node: &Node,
    ) -> Result<(RemoteWorkerState, PocSubStatus), BrokerError>;

    async fn stop(&self, node: &Node) -> Result<(), BrokerError>;
    async fn init_generate_v1(&self, node: &Node) -> Result<(), BrokerError>;
    async fn init_validate_v1(&self, node: &Node) -> Result<(), BrokerError>;
    async fn init_generate_v2(&self, node: &Node) -> Result<(), BrokerError>;
    async fn init_validate_v2(&self, node: &Node) -> Result<(), BrokerError>;
    async fn init_inference(&self, node: &Node) -> Result<(), BrokerError>;
}
