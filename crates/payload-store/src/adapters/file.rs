//! File-backed payload store, used as the fallback leg of `HybridBackend`
//! and standalone in tests. Each record is a JSON file written via the
//! temp-file-then-rename pattern so a crash mid-write never leaves a
//! partially-written record visible.

use std::fs;
use std::path::PathBuf;

use node_types::{EpochId, PayloadKey, PayloadRecord};

use crate::domain::PayloadStoreError;
use crate::ports::outbound::PayloadBackend;

pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &PayloadKey) -> PathBuf {
        self.base_dir
            .join(format!("{}_{}.json", key.epoch_id, key.inference_id))
    }
}

impl PayloadBackend for FileBackend {
    fn put(&self, key: &PayloadKey, record: &PayloadRecord) -> Result<(), PayloadStoreError> {
        let path = self.path_for(key);
        let bytes =
            serde_json::to_vec(record).map_err(|e| PayloadStoreError::Io(e.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| PayloadStoreError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &path).map_err(|e| PayloadStoreError::Io(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &PayloadKey) -> Result<Option<PayloadRecord>, PayloadStoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| PayloadStoreError::Io(e.to_string()))?;
        let record = serde_json::from_slice(&bytes)
            .map_err(|e| PayloadStoreError::Corrupt(key.clone(), e.to_string()))?;
        Ok(Some(record))
    }

    fn delete(&self, key: &PayloadKey) -> Result<(), PayloadStoreError> {
        let path = self.path_for(key);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PayloadStoreError::Io(e.to_string())),
        }
    }

    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), PayloadStoreError> {
        let prefix = format!("{epoch_id}_");
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(PayloadStoreError::Io(e.to_string())),
        };
        for entry in entries {
            let entry = entry.map_err(|e| PayloadStoreError::Io(e.to_string()))?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(PayloadStoreError::Io(e.to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record() -> PayloadRecord {
        PayloadRecord {
            prompt_payload: b"prompt".to_vec(),
            response_payload: b"response".to_vec(),
            prompt_hash: [1; 32],
            response_hash: [2; 32],
            created_at: 1,
        }
    }

    #[test]
    fn put_get_delete_round_trip() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        let key = PayloadKey { epoch_id: 1, inference_id: "abc".into() };
        backend.put(&key, &record()).unwrap();
        assert!(backend.get(&key).unwrap().is_some());
        backend.delete(&key).unwrap();
        assert!(backend.get(&key).unwrap().is_none());
    }

    #[test]
    fn prune_epoch_removes_only_that_epochs_files() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        let kept = PayloadKey { epoch_id: 2, inference_id: "keep".into() };
        let dropped = PayloadKey { epoch_id: 1, inference_id: "drop".into() };
        backend.put(&kept, &record()).unwrap();
        backend.put(&dropped, &record()).unwrap();

        backend.prune_epoch(1).unwrap();

        assert!(backend.get(&kept).unwrap().is_some());
        assert!(backend.get(&dropped).unwrap().is_none());
    }
}
