//! Adapts a concrete `NodeBrokerService` onto the validator's
//! [`NodeLeasing`] port. `NodeBrokerService::begin_lease`/`release_lease`
//! are inherent methods (not part of the `NodeBroker` trait, since a
//! generic method would make that trait non-dyn-compatible), so this
//! wrapper is where the validator crosses back into a concrete type.

use std::sync::Arc;

use node_broker::ports::outbound::WorkerTransport;
use node_broker::NodeBrokerService;
use node_types::Node;

use crate::domain::errors::ValidatorError;
use crate::ports::outbound::NodeLeasing;

pub struct BrokerLease<T: WorkerTransport + 'static>(Arc<NodeBrokerService<T>>);

impl<T: WorkerTransport + 'static> BrokerLease<T> {
    pub fn new(broker: Arc<NodeBrokerService<T>>) -> Self {
        Self(broker)
    }
}

impl<T: WorkerTransport + 'static> NodeLeasing for BrokerLease<T> {
    fn begin_lease(&self, model: &str) -> Result<Node, ValidatorError> {
        self.0.begin_lease(model).map_err(Into::into)
    }

    fn release_lease(&self, node_id: &str) {
        self.0.release_lease(node_id)
    }
}
