//! Acceptance predicates: pure functions over a phase snapshot deciding
//! whether freshly-arrived PoC artifacts, validations, or a stage's store
//! commit should be accepted right now.

use node_types::{ConfirmationPhase, Epoch, Phase};
use phase_tracker::PhaseSnapshot;

pub fn should_accept_generated_artifacts(snapshot: &PhaseSnapshot) -> bool {
    match snapshot.phase {
        Phase::PoCGenerate => true,
        Phase::PoCGenerateWindDown => snapshot.epoch.is_poc_exchange_window(snapshot.block_height),
        Phase::Inference => snapshot
            .confirmation_event
            .map(|ev| ev.phase == ConfirmationPhase::Generation && ev.contains(snapshot.block_height))
            .unwrap_or(false),
        _ => false,
    }
}

pub fn should_accept_validated_artifacts(snapshot: &PhaseSnapshot) -> bool {
    match snapshot.phase {
        Phase::PoCValidate | Phase::PoCValidateWindDown => true,
        Phase::Inference => snapshot
            .confirmation_event
            .map(|ev| ev.phase == ConfirmationPhase::Validation)
            .unwrap_or(false),
        _ => false,
    }
}

pub fn should_accept_store_commit(epoch: &Epoch, block_height: u64, stage_height: u64) -> bool {
    epoch.is_poc_exchange_window(block_height) || epoch.is_start_of_poc_stage(stage_height)
}

/// True once the generate stage has handed off to validation: the
/// generation-phase weight vector is final and safe to publish.
pub fn should_have_distributed_weights(snapshot: &PhaseSnapshot) -> bool {
    matches!(
        snapshot.phase,
        Phase::PoCGenerateWindDown | Phase::PoCValidate | Phase::PoCValidateWindDown
    )
}

pub fn current_stage_height(snapshot: &PhaseSnapshot) -> u64 {
    match snapshot.confirmation_event {
        Some(ev) => ev.trigger_height,
        None => snapshot.epoch.poc_start_block_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_types::ConfirmationPocEvent;

    fn epoch() -> Epoch {
        Epoch {
            epoch_index: 0,
            start_block_height: 0,
            poc_start_block_height: 100,
            epoch_length: 1_000,
            poc_stage_duration: 50,
            wind_down_blocks: 10,
        }
    }

    fn snapshot(phase: Phase, block_height: u64) -> PhaseSnapshot {
        PhaseSnapshot {
            block_height,
            epoch: epoch(),
            phase,
            confirmation_event: None,
            pocv2_enabled: true,
            confirmation_pocv2_enabled: true,
        }
    }

    #[test]
    fn accepts_generated_artifacts_during_generate_phase() {
        assert!(should_accept_generated_artifacts(&snapshot(Phase::PoCGenerate, 110)));
        assert!(!should_accept_generated_artifacts(&snapshot(Phase::PoCValidate, 170)));
    }

    #[test]
    fn accepts_generated_artifacts_during_confirmation_generation() {
        let mut s = snapshot(Phase::Inference, 500);
        s.confirmation_event = Some(ConfirmationPocEvent {
            trigger_height: 500,
            phase: ConfirmationPhase::Generation,
            batch_window_start: 500,
            batch_window_end: 520,
        });
        assert!(should_accept_generated_artifacts(&s));
        assert!(!should_accept_validated_artifacts(&s));
    }

    #[test]
    fn store_commit_accepted_at_stage_start_or_exchange_window() {
        let e = epoch();
        assert!(should_accept_store_commit(&e, 100, 100));
        assert!(should_accept_store_commit(&e, 150, 999));
        assert!(!should_accept_store_commit(&e, 120, 999));
    }
}
