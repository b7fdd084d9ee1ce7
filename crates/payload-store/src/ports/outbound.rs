use node_types::{EpochId, PayloadKey, PayloadRecord};

use crate::domain::PayloadStoreError;

/// A single storage backend, either durable or file-backed. `HybridBackend`
/// composes two of these with a fallback policy.
pub trait PayloadBackend: Send + Sync {
    fn put(&self, key: &PayloadKey, record: &PayloadRecord) -> Result<(), PayloadStoreError>;
    fn get(&self, key: &PayloadKey) -> Result<Option<PayloadRecord>, PayloadStoreError>;
    fn delete(&self, key: &PayloadKey) -> Result<(), PayloadStoreError>;

    /// Drop every record under `epoch_id` as a unit (a whole partition for
    /// the durable leg, a whole directory for the file leg).
    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), PayloadStoreError>;
}

impl PayloadBackend for Box<dyn PayloadBackend> {
    fn put(&self, key: &PayloadKey, record: &PayloadRecord) -> Result<(), PayloadStoreError> {
        (**self).put(key, record)
    }

    fn get(&self, key: &PayloadKey) -> Result<Option<PayloadRecord>, PayloadStoreError> {
        (**self).get(key)
    }

    fn delete(&self, key: &PayloadKey) -> Result<(), PayloadStoreError> {
        (**self).delete(key)
    }

    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), PayloadStoreError> {
        (**self).prune_epoch(epoch_id)
    }
}
