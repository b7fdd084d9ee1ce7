//! In-memory log backend used by unit tests and by the executor-server's
//! test double for the artifact store port.

use std::collections::HashMap;
use std::sync::Mutex;

use node_types::ArtifactLeaf;

use crate::ports::outbound::ArtifactLogBackend;

#[derive(Default)]
pub struct InMemoryArtifactLog {
    stages: Mutex<HashMap<u64, Vec<ArtifactLeaf>>>,
}

impl InMemoryArtifactLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactLogBackend for InMemoryArtifactLog {
    fn append(&self, stage_start_height: u64, leaf: &ArtifactLeaf) -> std::io::Result<()> {
        self.stages
            .lock()
            .unwrap()
            .entry(stage_start_height)
            .or_default()
            .push(leaf.clone());
        Ok(())
    }

    fn load(&self, stage_start_height: u64) -> std::io::Result<Vec<ArtifactLeaf>> {
        Ok(self
            .stages
            .lock()
            .unwrap()
            .get(&stage_start_height)
            .cloned()
            .unwrap_or_default())
    }

    fn delete(&self, stage_start_height: u64) -> std::io::Result<()> {
        self.stages.lock().unwrap().remove(&stage_start_height);
        Ok(())
    }
}
