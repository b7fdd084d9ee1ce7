//! # Artifact Store
//!
//! Append-only log of PoC artifact leaves per stage, committed to a
//! Merkle Mountain Range so a validator can be handed a compact proof for
//! one leaf instead of the whole log. One log per
//! `poc_stage_start_block_height`; retention keeps a bounded window of
//! recent stages and prunes the rest.
//!
//! - `domain` — the MMR and the per-stage log it sits under
//! - `ports` — inbound (what callers can do) and outbound (durable log) traits
//! - `adapters` — file-backed and in-memory log backends
//! - `service` — `ManagedArtifactStore`, the port implementation

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{ArtifactMmr, ArtifactProof, ArtifactStoreError};
pub use ports::inbound::ArtifactStorePort;
pub use ports::outbound::ArtifactLogBackend;
pub use service::ManagedArtifactStore;
