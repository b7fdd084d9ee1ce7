//! No-op durable leg used when no durable connection is configured
//! (`PGHOST` unset). Every call fails so `HybridBackend` falls straight
//! through to the file leg without ever touching a real connection.

use node_types::{EpochId, PayloadKey, PayloadRecord};

use crate::domain::PayloadStoreError;
use crate::ports::outbound::PayloadBackend;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullDurableBackend;

impl PayloadBackend for NullDurableBackend {
    fn put(&self, _key: &PayloadKey, _record: &PayloadRecord) -> Result<(), PayloadStoreError> {
        Err(PayloadStoreError::DurableUnavailable("no durable backend configured".to_string()))
    }

    fn get(&self, _key: &PayloadKey) -> Result<Option<PayloadRecord>, PayloadStoreError> {
        Err(PayloadStoreError::DurableUnavailable("no durable backend configured".to_string()))
    }

    fn delete(&self, _key: &PayloadKey) -> Result<(), PayloadStoreError> {
        Err(PayloadStoreError::DurableUnavailable("no durable backend configured".to_string()))
    }

    fn prune_epoch(&self, _epoch_id: EpochId) -> Result<(), PayloadStoreError> {
        Err(PayloadStoreError::DurableUnavailable("no durable backend configured".to_string()))
    }
}
