//! # Durable Stream
//!
//! An append-only outbox: callers append a payload, get back an id, and
//! ack that id once its effect has landed elsewhere. Anything not yet
//! acked is still in the log and comes back from [`DurableLog::replay`],
//! so a process that appends-then-crashes doesn't lose queued work.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! - `domain` - `DurableStreamError`
//! - `ports`  - `DurableLog` (inbound), `DurableLogBackend` (outbound)
//! - `adapters` - `RocksDurableLog`, `InMemoryDurableLog`
//! - `service` - `DurableStream`, the `DurableLog` implementation

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::DurableStreamError;
pub use ports::inbound::DurableLog;
pub use ports::outbound::DurableLogBackend;
pub use service::{decode, encode, DurableStream};
