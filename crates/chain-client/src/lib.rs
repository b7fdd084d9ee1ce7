//! # Chain Client
//!
//! Batches outbound chain messages (inference lifecycle events, PoC
//! submissions, validation results) by [`node_types::MessageKind`] and
//! dispatches them to the chain's RPC surface through the [`ChainRpc`]
//! outbound port, tracking each submission until it is acknowledged or
//! its ack window lapses and the batch is retried. Every message is
//! appended to a `durable_stream::DurableLog` before it is admitted to a
//! batch and acked once its batch is confirmed, so a restart replays
//! whatever was still pending or in flight.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! - `domain` - `PendingBatch`, `QueuedMessage`, `InFlightBatch`, `ChainClientError`
//! - `ports`  - `MessageClient` (inbound), `ChainRpc` (outbound)
//! - `adapters` - `MockChainRpc` test double
//! - `service` - `ChainClientService`, the `MessageClient` implementation

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{ChainClientError, InFlightBatch, PendingBatch, QueuedMessage};
pub use ports::inbound::MessageClient;
pub use ports::outbound::ChainRpc;
pub use service::ChainClientService;
