//! # Node Broker
//!
//! Owns the worker registry and, for each registered ML worker, a
//! single-consumer command queue enforcing the per-worker state machine
//! (idle/generating/validating/inference) that reconciles the broker's
//! cached view with what the worker itself reports.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! - `domain` - `NodeCommand`, `BrokerError`, registration validation
//! - `ports`  - `NodeBroker` (inbound), `WorkerTransport` (outbound)
//! - `adapters` - `MockWorkerTransport` test double
//! - `service` - `NodeBrokerService`, including the `lock_node` scoped lease

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{validate_node, BrokerError, NodeCommand};
pub use ports::inbound::NodeBroker;
pub use ports::outbound::WorkerTransport;
pub use service::NodeBrokerService;
