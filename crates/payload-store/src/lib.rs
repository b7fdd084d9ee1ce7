//! # Payload Store
//!
//! Stores the `(prompt, response)` payload pair for each inference behind
//! a hybrid durable/file backend, with a short TTL read cache in front so
//! a validator retry burst doesn't repeatedly hit the durable leg for the
//! same inference.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::PayloadStoreError;
pub use ports::inbound::PayloadStorePort;
pub use ports::outbound::PayloadBackend;
pub use service::ManagedPayloadStore;
