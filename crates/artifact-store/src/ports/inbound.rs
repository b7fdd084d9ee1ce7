//! Driving port: what the commit worker and executor server can ask the
//! artifact store to do.

use node_types::{ArtifactLeaf, CoreError};

use crate::domain::ArtifactProof;

pub trait ArtifactStorePort: Send + Sync {
    /// Append a leaf to the named stage's log. Returns the leaf's index.
    /// Rejects a nonce already seen in this stage with `CoreError::DuplicateNonce`.
    fn submit(&self, stage_start_height: u64, leaf: ArtifactLeaf) -> Result<u64, CoreError>;

    /// Current MMR root for a stage, or `NotFound` if the stage has no leaves yet.
    fn root(&self, stage_start_height: u64) -> Result<[u8; 32], CoreError>;

    /// Inclusion proof for one leaf, verifiable against `root`.
    fn prove(&self, stage_start_height: u64, leaf_index: u64) -> Result<ArtifactProof, CoreError>;

    /// The `i`-th accepted `(nonce, vector)` pair for a stage, by
    /// position, the same positional read a validator's proof depends on.
    fn get_artifact(&self, stage_start_height: u64, leaf_index: u64) -> Result<ArtifactLeaf, CoreError>;

    /// Number of leaves committed to a stage.
    fn leaf_count(&self, stage_start_height: u64) -> u64;

    /// Drop every stage whose start height is strictly before `cutoff`,
    /// keeping at most `retain` stages regardless of cutoff.
    fn prune(&self, cutoff: u64, retain: usize);
}
