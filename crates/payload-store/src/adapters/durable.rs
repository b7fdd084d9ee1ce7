//! RocksDB-backed primary payload store.

use node_types::{EpochId, PayloadKey, PayloadRecord};
use rocksdb::DB;

use crate::domain::PayloadStoreError;
use crate::ports::outbound::PayloadBackend;

pub struct DurableBackend {
    db: DB,
}

impl DurableBackend {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PayloadStoreError> {
        let db = DB::open_default(path).map_err(|e| PayloadStoreError::DurableUnavailable(e.to_string()))?;
        Ok(Self { db })
    }

    fn key_bytes(key: &PayloadKey) -> Vec<u8> {
        format!("{}:{}", key.epoch_id, key.inference_id).into_bytes()
    }
}

impl PayloadBackend for DurableBackend {
    fn put(&self, key: &PayloadKey, record: &PayloadRecord) -> Result<(), PayloadStoreError> {
        let bytes =
            serde_json::to_vec(record).map_err(|e| PayloadStoreError::Io(e.to_string()))?;
        self.db
            .put(Self::key_bytes(key), bytes)
            .map_err(|e| PayloadStoreError::DurableUnavailable(e.to_string()))
    }

    fn get(&self, key: &PayloadKey) -> Result<Option<PayloadRecord>, PayloadStoreError> {
        let bytes = self
            .db
            .get(Self::key_bytes(key))
            .map_err(|e| PayloadStoreError::DurableUnavailable(e.to_string()))?;
        match bytes {
            None => Ok(None),
            Some(b) => {
                let record = serde_json::from_slice(&b)
                    .map_err(|e| PayloadStoreError::Corrupt(key.clone(), e.to_string()))?;
                Ok(Some(record))
            }
        }
    }

    fn delete(&self, key: &PayloadKey) -> Result<(), PayloadStoreError> {
        self.db
            .delete(Self::key_bytes(key))
            .map_err(|e| PayloadStoreError::DurableUnavailable(e.to_string()))
    }

    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), PayloadStoreError> {
        let prefix = format!("{epoch_id}:");
        let keys: Vec<Box<[u8]>> = self
            .db
            .prefix_iterator(prefix.as_bytes())
            .filter_map(|item| item.ok())
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix.as_bytes()))
            .collect();
        for key in keys {
            self.db
                .delete(key)
                .map_err(|e| PayloadStoreError::DurableUnavailable(e.to_string()))?;
        }
        Ok(())
    }
}
