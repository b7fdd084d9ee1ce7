//! # Node Types
//!
//! Domain entities, configuration, and the shared error taxonomy for every
//! component of the API node: the epoch/phase model, worker/node records,
//! PoC artifact and payload keys, and the transaction deadline table.
//!
//! No component owns its own copy of these types; they are the single
//! source of truth shared across `artifact-store`, `payload-store`,
//! `phase-tracker`, `chain-client`, `node-broker`, `commit-worker`,
//! `executor-server`, and `validator`.

pub mod config;
pub mod entities;
pub mod errors;
pub mod phase;

pub use config::{NodeConfig, TxDeadlineTable};
pub use entities::*;
pub use errors::CoreError;
pub use phase::{ConfirmationPhase, ConfirmationPocEvent, Epoch, Phase};
