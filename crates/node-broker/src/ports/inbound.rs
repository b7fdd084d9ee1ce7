//! Primary API other components use to manage and drive workers.

use async_trait::async_trait;
use node_types::{CommandResult, HardwareInfo, Node};

use crate::domain::BrokerError;

#[async_trait]
pub trait NodeBroker: Send + Sync {
    async fn register_node(&self, node: Node) -> Result<Node, BrokerError>;
    async fn update_node(&self, node: Node) -> Result<Node, BrokerError>;
    async fn remove_node(&self, id: &str) -> Result<(), BrokerError>;
    async fn set_admin_state(&self, id: &str, enabled: bool, epoch: u64) -> Result<(), BrokerError>;
    async fn update_hardware(&self, id: &str, hardware: Vec<HardwareInfo>) -> Result<(), BrokerError>;

    async fn start_poc(&self, id: &str, v2: bool) -> Result<CommandResult, BrokerError>;
    async fn init_validate(&self, id: &str, v2: bool) -> Result<CommandResult, BrokerError>;
    async fn stop_node(&self, id: &str) -> Result<CommandResult, BrokerError>;
    async fn init_inference(&self, id: &str) -> Result<CommandResult, BrokerError>;
}
