//! # Validator
//!
//! Samples a fraction of inferences each epoch for revalidation, weighted
//! by stake and governed by a chain-set sample rate, then retrieves the
//! executor's reported payload, replays it on a leased local worker, scores
//! the replay against the originally reported logits, and reports the
//! outcome on-chain.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! - `domain` - sampling decision, replay scoring, retry/staleness schedule
//! - `ports`  - `ValidationChainQuery`, `ExecutorClient`, `WorkerReplayClient`,
//!   `NodeLeasing` (outbound)
//! - `adapters` - `BrokerLease` over a concrete `node_broker::NodeBrokerService`,
//!   plus in-memory test doubles for every outbound port
//! - `service` - `Validator`, the orchestration of sample/retrieve/replay/
//!   score/report

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::ValidatorError;
pub use service::{Validator, ValidationReport};
