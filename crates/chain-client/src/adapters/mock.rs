//! In-memory `ChainRpc` used by tests and as the default until a real
//! RPC/gRPC client lands behind this port.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use node_types::{ChainMessage, MessageKind};

use crate::domain::ChainClientError;
use crate::ports::outbound::ChainRpc;

#[derive(Default)]
pub struct MockChainRpc {
    counter: AtomicU64,
    acknowledged: Mutex<std::collections::HashSet<String>>,
}

impl MockChainRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: mark a previously submitted batch as confirmed.
    pub fn acknowledge(&self, tx_ref: &str) {
        self.acknowledged.lock().insert(tx_ref.to_string());
    }
}

impl ChainRpc for MockChainRpc {
    fn submit_batch(
        &self,
        _kind: MessageKind,
        _messages: &[ChainMessage],
    ) -> Result<String, ChainClientError> {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(format!("mock-tx-{id}"))
    }

    fn is_acknowledged(&self, tx_ref: &str) -> Result<bool, ChainClientError> {
        Ok(self.acknowledged.lock().contains(tx_ref))
    }
}
