//! Driven port: the durable log backend the service appends to and
//! reloads from on startup.

use node_types::ArtifactLeaf;

pub trait ArtifactLogBackend: Send + Sync {
    fn append(&self, stage_start_height: u64, leaf: &ArtifactLeaf) -> std::io::Result<()>;

    /// Full replay of a stage's log, in append order, for warm start.
    fn load(&self, stage_start_height: u64) -> std::io::Result<Vec<ArtifactLeaf>>;

    fn delete(&self, stage_start_height: u64) -> std::io::Result<()>;
}
