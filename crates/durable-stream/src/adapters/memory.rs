//! In-memory log used by tests and as the default when no durable path
//! is configured. Nothing here survives a restart; a real deployment
//! always pairs `DurableStream` with [`crate::adapters::RocksDurableLog`].

use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::domain::DurableStreamError;
use crate::ports::outbound::DurableLogBackend;

#[derive(Default)]
pub struct InMemoryDurableLog {
    entries: Mutex<BTreeMap<u64, Vec<u8>>>,
}

impl InMemoryDurableLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableLogBackend for InMemoryDurableLog {
    fn append(&self, id: u64, payload: &[u8]) -> Result<(), DurableStreamError> {
        self.entries.lock().insert(id, payload.to_vec());
        Ok(())
    }

    fn remove(&self, id: u64) -> Result<(), DurableStreamError> {
        self.entries.lock().remove(&id);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(u64, Vec<u8>)>, DurableStreamError> {
        Ok(self.entries.lock().iter().map(|(id, bytes)| (*id, bytes.clone())).collect())
    }
}
