use node_types::{ConfirmationPocEvent, Epoch, Phase};

/// Point-in-time read of the tracker's cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSnapshot {
    pub block_height: u64,
    pub epoch: Epoch,
    pub phase: Phase,
    pub confirmation_event: Option<ConfirmationPocEvent>,
    pub pocv2_enabled: bool,
    pub confirmation_pocv2_enabled: bool,
}

impl PhaseSnapshot {
    pub fn genesis(epoch: Epoch) -> Self {
        let phase = epoch.current_phase(epoch.start_block_height);
        Self {
            block_height: epoch.start_block_height,
            epoch,
            phase,
            confirmation_event: None,
            pocv2_enabled: true,
            confirmation_pocv2_enabled: true,
        }
    }
}
