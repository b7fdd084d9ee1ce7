//! `ManagedPayloadStore`: a TTL read cache in front of any `PayloadBackend`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use node_types::{CoreError, EpochId, PayloadKey, PayloadRecord};

use crate::ports::inbound::PayloadStorePort;
use crate::ports::outbound::PayloadBackend;

/// A fresh process with a high starting epoch must not walk hundreds of
/// historical epochs looking for something to prune.
const MAX_PRUNE_LOOKBACK: u64 = 10;

/// Hard cap on the read cache so an adversarial spread of distinct
/// inference ids can't grow it unbounded between TTL sweeps.
const MAX_CACHE_ENTRIES: usize = 10_000;

struct CacheEntry {
    record: PayloadRecord,
    inserted_at: Instant,
}

pub struct ManagedPayloadStore<B> {
    backend: B,
    cache: Mutex<HashMap<PayloadKey, CacheEntry>>,
    ttl: Duration,
}

impl<B: PayloadBackend> ManagedPayloadStore<B> {
    pub fn new(backend: B, ttl: Duration) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn cache_insert(&self, key: PayloadKey, record: PayloadRecord) {
        let mut cache = self.cache.lock();
        cache.insert(key, CacheEntry { record, inserted_at: Instant::now() });
        if cache.len() > MAX_CACHE_ENTRIES {
            if let Some(oldest) = cache
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest);
            }
        }
    }

    /// Drop every cache entry older than the TTL. Intended to be run on a
    /// periodic background tick; cache misses age out lazily on read too.
    pub fn prune_expired(&self) {
        let now = Instant::now();
        self.cache
            .lock()
            .retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
    }

    /// Auto-prune epochs older than `max_epoch - retain_count`, clamped to
    /// at most `MAX_PRUNE_LOOKBACK` epochs per call. Intended to be run
    /// on a periodic background tick alongside `prune_expired`.
    pub fn prune_epochs_before(&self, max_epoch: EpochId, retain_count: u64) {
        let cutoff = max_epoch.saturating_sub(retain_count);
        let earliest = cutoff.saturating_sub(MAX_PRUNE_LOOKBACK);
        for epoch in earliest..cutoff {
            if let Err(e) = self.backend.prune_epoch(epoch) {
                tracing::warn!(epoch, error = %e, "epoch prune failed");
            }
        }
        self.cache.lock().retain(|k, _| k.epoch_id >= cutoff);
    }
}

impl<B: PayloadBackend> PayloadStorePort for ManagedPayloadStore<B> {
    fn put(&self, key: PayloadKey, record: PayloadRecord) -> Result<(), CoreError> {
        self.backend.put(&key, &record)?;
        self.cache_insert(key, record);
        Ok(())
    }

    fn get(&self, key: &PayloadKey) -> Result<PayloadRecord, CoreError> {
        if let Some(entry) = self.cache.lock().get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(entry.record.clone());
            }
        }
        let record = self
            .backend
            .get(key)?
            .ok_or_else(|| CoreError::PayloadUnavailable(key.inference_id.clone()))?;
        self.cache_insert(key.clone(), record.clone());
        Ok(record)
    }

    fn delete(&self, key: &PayloadKey) -> Result<(), CoreError> {
        self.backend.delete(key)?;
        self.cache.lock().remove(key);
        Ok(())
    }

    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), CoreError> {
        self.backend.prune_epoch(epoch_id)?;
        self.cache.lock().retain(|k, _| k.epoch_id != epoch_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FileBackend;
    use tempfile::tempdir;

    #[test]
    fn put_then_get_hits_cache() {
        let dir = tempdir().unwrap();
        let store = ManagedPayloadStore::new(
            FileBackend::new(dir.path()).unwrap(),
            Duration::from_secs(60),
        );
        let key = PayloadKey { epoch_id: 1, inference_id: "x".into() };
        let record = PayloadRecord {
            prompt_payload: vec![1],
            response_payload: vec![2],
            prompt_hash: [0; 32],
            response_hash: [0; 32],
            created_at: 0,
        };
        store.put(key.clone(), record.clone()).unwrap();
        assert_eq!(store.get(&key).unwrap().prompt_payload, record.prompt_payload);
    }

    #[test]
    fn prune_epoch_drops_only_that_epochs_records() {
        let dir = tempdir().unwrap();
        let store = ManagedPayloadStore::new(
            FileBackend::new(dir.path()).unwrap(),
            Duration::from_secs(60),
        );
        let record = PayloadRecord {
            prompt_payload: vec![1],
            response_payload: vec![2],
            prompt_hash: [0; 32],
            response_hash: [0; 32],
            created_at: 0,
        };
        let kept = PayloadKey { epoch_id: 2, inference_id: "keep".into() };
        let dropped = PayloadKey { epoch_id: 1, inference_id: "drop".into() };
        store.put(kept.clone(), record.clone()).unwrap();
        store.put(dropped.clone(), record).unwrap();

        store.prune_epoch(1).unwrap();

        assert!(store.get(&kept).is_ok());
        assert!(matches!(store.get(&dropped).unwrap_err(), CoreError::PayloadUnavailable(_)));
    }

    #[test]
    fn prune_epochs_before_clamps_to_max_lookback() {
        let dir = tempdir().unwrap();
        let store = ManagedPayloadStore::new(
            FileBackend::new(dir.path()).unwrap(),
            Duration::from_secs(60),
        );
        let record = PayloadRecord {
            prompt_payload: vec![1],
            response_payload: vec![2],
            prompt_hash: [0; 32],
            response_hash: [0; 32],
            created_at: 0,
        };
        for epoch in 0..10u64 {
            store
                .put(PayloadKey { epoch_id: epoch, inference_id: "x".into() }, record.clone())
                .unwrap();
        }
        // max_epoch=9, retain_count=5 -> cutoff=4, earliest=cutoff-10 clamps at 0.
        store.prune_epochs_before(9, 5);
        for epoch in 0..4u64 {
            let key = PayloadKey { epoch_id: epoch, inference_id: "x".into() };
            assert!(store.get(&key).is_err(), "epoch {epoch} should have been pruned");
        }
        for epoch in 4..10u64 {
            let key = PayloadKey { epoch_id: epoch, inference_id: "x".into() };
            assert!(store.get(&key).is_ok(), "epoch {epoch} should have survived");
        }
    }

    #[test]
    fn missing_key_is_payload_unavailable() {
        let dir = tempdir().unwrap();
        let store = ManagedPayloadStore::new(
            FileBackend::new(dir.path()).unwrap(),
            Duration::from_secs(60),
        );
        let key = PayloadKey { epoch_id: 1, inference_id: "missing".into() };
        assert!(matches!(store.get(&key).unwrap_err(), CoreError::PayloadUnavailable(_)));
    }
}
