//! Driven port: the raw byte-oriented append log a concrete backend (or a
//! mock, for tests) stores entries against. `DurableStream` builds the
//! typed, id-assigning API on top of this.

use crate::domain::DurableStreamError;

pub trait DurableLogBackend: Send + Sync {
    /// Append a new entry at `id`. Ids are assigned by the caller and are
    /// monotonically increasing, so the backend need not generate them.
    fn append(&self, id: u64, payload: &[u8]) -> Result<(), DurableStreamError>;

    /// Remove an acknowledged entry. A double-ack (entry already gone) is
    /// not an error.
    fn remove(&self, id: u64) -> Result<(), DurableStreamError>;

    /// Every entry still present, in ascending id order.
    fn load_all(&self) -> Result<Vec<(u64, Vec<u8>)>, DurableStreamError>;
}

impl DurableLogBackend for Box<dyn DurableLogBackend> {
    fn append(&self, id: u64, payload: &[u8]) -> Result<(), DurableStreamError> {
        (**self).append(id, payload)
    }

    fn remove(&self, id: u64) -> Result<(), DurableStreamError> {
        (**self).remove(id)
    }

    fn load_all(&self) -> Result<Vec<(u64, Vec<u8>)>, DurableStreamError> {
        (**self).load_all()
    }
}
