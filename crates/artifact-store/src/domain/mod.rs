//! # Domain Layer
//!
//! Pure domain logic for the artifact store: the MMR accumulator and the
//! per-stage log it sits under.

pub mod entities;
pub mod errors;
pub mod mmr;

pub use entities::StageLog;
pub use errors::ArtifactStoreError;
pub use mmr::{ArtifactMmr, ArtifactProof};
