//! RocksDB-backed log. Keys are big-endian `u64` ids so iteration order
//! matches append order without needing a separate index.

use rocksdb::{IteratorMode, DB};

use crate::domain::DurableStreamError;
use crate::ports::outbound::DurableLogBackend;

pub struct RocksDurableLog {
    db: DB,
}

impl RocksDurableLog {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DurableStreamError> {
        let db = DB::open_default(path).map_err(|e| DurableStreamError::BackendUnavailable(e.to_string()))?;
        Ok(Self { db })
    }

    fn key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }
}

impl DurableLogBackend for RocksDurableLog {
    fn append(&self, id: u64, payload: &[u8]) -> Result<(), DurableStreamError> {
        self.db
            .put(Self::key(id), payload)
            .map_err(|e| DurableStreamError::BackendUnavailable(e.to_string()))
    }

    fn remove(&self, id: u64) -> Result<(), DurableStreamError> {
        self.db
            .delete(Self::key(id))
            .map_err(|e| DurableStreamError::BackendUnavailable(e.to_string()))
    }

    fn load_all(&self) -> Result<Vec<(u64, Vec<u8>)>, DurableStreamError> {
        self.db
            .iterator(IteratorMode::Start)
            .map(|item| {
                let (key, value) =
                    item.map_err(|e| DurableStreamError::BackendUnavailable(e.to_string()))?;
                let id = u64::from_be_bytes(
                    key.as_ref()
                        .try_into()
                        .map_err(|_| DurableStreamError::BackendUnavailable("malformed key".to_string()))?,
                );
                Ok((id, value.to_vec()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_load_all_round_trips_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = RocksDurableLog::open(dir.path()).unwrap();
        log.append(3, b"c").unwrap();
        log.append(1, b"a").unwrap();
        log.append(2, b"b").unwrap();
        let loaded = log.load_all().unwrap();
        assert_eq!(loaded, vec![(1, b"a".to_vec()), (2, b"b".to_vec()), (3, b"c".to_vec())]);
    }

    #[test]
    fn removed_entries_do_not_reappear() {
        let dir = tempfile::tempdir().unwrap();
        let log = RocksDurableLog::open(dir.path()).unwrap();
        log.append(1, b"a").unwrap();
        log.remove(1).unwrap();
        assert!(log.load_all().unwrap().is_empty());
    }
}
