use node_types::{CoreError, EpochId, PayloadKey, PayloadRecord};

pub trait PayloadStorePort: Send + Sync {
    fn put(&self, key: PayloadKey, record: PayloadRecord) -> Result<(), CoreError>;
    fn get(&self, key: &PayloadKey) -> Result<PayloadRecord, CoreError>;
    fn delete(&self, key: &PayloadKey) -> Result<(), CoreError>;

    /// Drop every stored payload for `epoch_id` as a unit.
    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), CoreError>;
}
