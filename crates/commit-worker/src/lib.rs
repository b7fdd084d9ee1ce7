//! # Commit Worker
//!
//! Background tick loop that, once per block, decides whether the current
//! PoC stage's store root should be committed on-chain and whether the
//! per-node weight distribution derived from that stage is ready to
//! publish. All acceptance decisions are pure functions over a
//! [`phase_tracker::PhaseSnapshot`] so they can be exhaustively tested
//! without a running chain.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{distribute_weights, should_accept_store_commit, should_have_distributed_weights};
pub use ports::NodeDistributionSource;
pub use service::CommitWorker;
