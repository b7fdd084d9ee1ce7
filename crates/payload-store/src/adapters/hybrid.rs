//! Hybrid backend: durable (rocksdb) primary with a file-backed fallback.
//! Once the durable leg errors, further writes go to the file leg until a
//! throttled reconnect probe succeeds again, so a down database doesn't
//! turn every request into a multi-second timeout.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use node_types::{EpochId, PayloadKey, PayloadRecord};

use crate::domain::PayloadStoreError;
use crate::ports::outbound::PayloadBackend;

pub struct HybridBackend<D, F> {
    durable: D,
    fallback: F,
    durable_unhealthy: AtomicBool,
    next_reconnect_probe_unix: AtomicU64,
    reconnect_throttle: Duration,
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

impl<D: PayloadBackend, F: PayloadBackend> HybridBackend<D, F> {
    pub fn new(durable: D, fallback: F, reconnect_throttle: Duration) -> Self {
        Self {
            durable,
            fallback,
            durable_unhealthy: AtomicBool::new(false),
            next_reconnect_probe_unix: AtomicU64::new(0),
            reconnect_throttle,
        }
    }

    fn should_try_durable(&self) -> bool {
        if !self.durable_unhealthy.load(Ordering::Relaxed) {
            return true;
        }
        now_unix() >= self.next_reconnect_probe_unix.load(Ordering::Relaxed)
    }

    fn mark_durable_failed(&self) {
        self.durable_unhealthy.store(true, Ordering::Relaxed);
        self.next_reconnect_probe_unix
            .store(now_unix() + self.reconnect_throttle.as_secs(), Ordering::Relaxed);
    }

    fn mark_durable_healthy(&self) {
        self.durable_unhealthy.store(false, Ordering::Relaxed);
    }
}

impl<D: PayloadBackend, F: PayloadBackend> PayloadBackend for HybridBackend<D, F> {
    fn put(&self, key: &PayloadKey, record: &PayloadRecord) -> Result<(), PayloadStoreError> {
        if self.should_try_durable() {
            match self.durable.put(key, record) {
                Ok(()) => {
                    self.mark_durable_healthy();
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "durable payload write failed, falling back to file");
                    self.mark_durable_failed();
                }
            }
        }
        self.fallback.put(key, record)
    }

    fn get(&self, key: &PayloadKey) -> Result<Option<PayloadRecord>, PayloadStoreError> {
        if self.should_try_durable() {
            match self.durable.get(key) {
                Ok(Some(record)) => {
                    self.mark_durable_healthy();
                    return Ok(Some(record));
                }
                Ok(None) => {
                    self.mark_durable_healthy();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "durable payload read failed, falling back to file");
                    self.mark_durable_failed();
                }
            }
        }
        self.fallback.get(key)
    }

    fn delete(&self, key: &PayloadKey) -> Result<(), PayloadStoreError> {
        let durable_result = if self.should_try_durable() {
            self.durable.delete(key)
        } else {
            Ok(())
        };
        let fallback_result = self.fallback.delete(key);
        durable_result.and(fallback_result)
    }

    /// Best-effort against both legs: a durable-side failure is logged,
    /// not surfaced, since the caller's retention loop will retry this
    /// epoch on its next sweep regardless.
    fn prune_epoch(&self, epoch_id: EpochId) -> Result<(), PayloadStoreError> {
        if self.should_try_durable() {
            match self.durable.prune_epoch(epoch_id) {
                Ok(()) => self.mark_durable_healthy(),
                Err(e) => {
                    tracing::warn!(error = %e, "durable epoch prune failed, pruning file leg only");
                    self.mark_durable_failed();
                }
            }
        }
        self.fallback.prune_epoch(epoch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file::FileBackend;
    use crate::adapters::null::NullDurableBackend;
    use tempfile::tempdir;

    fn record() -> PayloadRecord {
        PayloadRecord {
            prompt_payload: vec![1],
            response_payload: vec![2],
            prompt_hash: [0; 32],
            response_hash: [0; 32],
            created_at: 0,
        }
    }

    #[test]
    fn falls_back_to_file_when_durable_leg_is_a_no_op() {
        let dir = tempdir().unwrap();
        let backend = HybridBackend::new(
            NullDurableBackend,
            FileBackend::new(dir.path()).unwrap(),
            Duration::from_secs(240),
        );
        let key = PayloadKey { epoch_id: 1, inference_id: "x".into() };
        backend.put(&key, &record()).unwrap();
        assert!(backend.get(&key).unwrap().is_some());
    }

    #[test]
    fn prune_epoch_is_best_effort_against_both_legs() {
        let dir = tempdir().unwrap();
        let backend = HybridBackend::new(
            NullDurableBackend,
            FileBackend::new(dir.path()).unwrap(),
            Duration::from_secs(240),
        );
        let key = PayloadKey { epoch_id: 1, inference_id: "x".into() };
        backend.put(&key, &record()).unwrap();
        backend.prune_epoch(1).unwrap();
        assert!(backend.get(&key).unwrap().is_none());
    }
}
