//! # Epoch / Phase Domain Model
//!
//! `Epoch` carries the chain-derived schedule for a single epoch; `Phase`
//! is a pure, deterministic function of `(epoch, block_height)`. Nothing
//! here is persisted — the phase tracker component (C3) is the only thing
//! that caches a computed value, and it recomputes from these definitions
//! on every block.

use serde::{Deserialize, Serialize};

/// Chain-derived parameters for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub epoch_index: u64,
    /// First block height belonging to this epoch.
    pub start_block_height: u64,
    /// Height at which this epoch's PoC-generate stage begins.
    pub poc_start_block_height: u64,
    /// Total number of blocks in the epoch.
    pub epoch_length: u64,
    /// Length, in blocks, of each PoC sub-stage (generate and validate).
    pub poc_stage_duration: u64,
    /// Blocks of grace period after each PoC sub-stage during which late
    /// artifacts/validations are still exchanged.
    pub wind_down_blocks: u64,
}

impl Epoch {
    fn generate_end(&self) -> u64 {
        self.poc_start_block_height + self.poc_stage_duration
    }

    fn generate_wind_down_end(&self) -> u64 {
        self.generate_end() + self.wind_down_blocks
    }

    fn validate_start(&self) -> u64 {
        self.generate_wind_down_end()
    }

    fn validate_end(&self) -> u64 {
        self.validate_start() + self.poc_stage_duration
    }

    fn validate_wind_down_end(&self) -> u64 {
        self.validate_end() + self.wind_down_blocks
    }

    /// Exclusive height at which the next epoch begins.
    pub fn end_block_height(&self) -> u64 {
        self.start_block_height + self.epoch_length
    }

    /// Pure phase computation: deterministic and monotone in `block_height`
    /// within this epoch (invariant 7 / testable property 7).
    pub fn current_phase(&self, block_height: u64) -> Phase {
        if block_height < self.poc_start_block_height {
            return Phase::Inference;
        }
        if block_height < self.generate_end() {
            Phase::PoCGenerate
        } else if block_height < self.generate_wind_down_end() {
            Phase::PoCGenerateWindDown
        } else if block_height < self.validate_end() {
            Phase::PoCValidate
        } else if block_height < self.validate_wind_down_end() {
            Phase::PoCValidateWindDown
        } else {
            Phase::Inference
        }
    }

    /// True while late artifact/validation exchange is still accepted for
    /// the stage that just ended.
    pub fn is_poc_exchange_window(&self, block_height: u64) -> bool {
        (block_height >= self.generate_end() && block_height < self.generate_wind_down_end())
            || (block_height >= self.validate_end() && block_height < self.validate_wind_down_end())
    }

    /// True if `block_height` is exactly the first block of a PoC stage.
    pub fn is_start_of_poc_stage(&self, block_height: u64) -> bool {
        block_height == self.poc_start_block_height || block_height == self.validate_start()
    }

    pub fn end_of_poc_generation(&self) -> u64 {
        self.generate_end()
    }

    pub fn inference_validation_cutoff(&self) -> u64 {
        self.validate_end()
    }

    pub fn claim_money(&self) -> u64 {
        self.end_block_height()
    }

    /// Height at which the PoC-validate stage begins.
    pub fn poc_validate_start(&self) -> u64 {
        self.validate_start()
    }
}

/// Discrete phase label, computed from `(block_height, epoch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    PoCGenerate,
    PoCGenerateWindDown,
    PoCValidate,
    PoCValidateWindDown,
    Inference,
}

/// Which side of an in-flight confirmation PoC round is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationPhase {
    Generation,
    Validation,
}

/// An additional PoC round triggered during the `Inference` phase. At most
/// one is active at a time; owned by the phase tracker (C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPocEvent {
    pub trigger_height: u64,
    pub phase: ConfirmationPhase,
    /// Inclusive window, in block heights, during which a batch submission
    /// for this confirmation event is accepted.
    pub batch_window_start: u64,
    pub batch_window_end: u64,
}

impl ConfirmationPocEvent {
    pub fn contains(&self, block_height: u64) -> bool {
        block_height >= self.batch_window_start && block_height <= self.batch_window_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> Epoch {
        Epoch {
            epoch_index: 3,
            start_block_height: 1_000,
            poc_start_block_height: 1_100,
            epoch_length: 1_000,
            poc_stage_duration: 50,
            wind_down_blocks: 10,
        }
    }

    #[test]
    fn phase_schedule_is_deterministic_and_ordered() {
        let e = epoch();
        assert_eq!(e.current_phase(1_099), Phase::Inference);
        assert_eq!(e.current_phase(1_100), Phase::PoCGenerate);
        assert_eq!(e.current_phase(1_149), Phase::PoCGenerate);
        assert_eq!(e.current_phase(1_150), Phase::PoCGenerateWindDown);
        assert_eq!(e.current_phase(1_159), Phase::PoCGenerateWindDown);
        assert_eq!(e.current_phase(1_160), Phase::PoCValidate);
        assert_eq!(e.current_phase(1_209), Phase::PoCValidate);
        assert_eq!(e.current_phase(1_210), Phase::PoCValidateWindDown);
        assert_eq!(e.current_phase(1_219), Phase::PoCValidateWindDown);
        assert_eq!(e.current_phase(1_220), Phase::Inference);
        assert_eq!(e.current_phase(1_999), Phase::Inference);
    }

    #[test]
    fn exchange_window_matches_wind_down_ranges() {
        let e = epoch();
        assert!(!e.is_poc_exchange_window(1_149));
        assert!(e.is_poc_exchange_window(1_150));
        assert!(e.is_poc_exchange_window(1_159));
        assert!(!e.is_poc_exchange_window(1_160));
        assert!(e.is_poc_exchange_window(1_210));
    }

    #[test]
    fn start_of_stage_markers() {
        let e = epoch();
        assert!(e.is_start_of_poc_stage(1_100));
        assert!(e.is_start_of_poc_stage(1_160));
        assert!(!e.is_start_of_poc_stage(1_101));
    }

    #[test]
    fn derived_cutoffs() {
        let e = epoch();
        assert_eq!(e.end_of_poc_generation(), 1_150);
        assert_eq!(e.inference_validation_cutoff(), 1_210);
        assert_eq!(e.claim_money(), 2_000);
    }

    #[test]
    fn confirmation_event_window() {
        let ev = ConfirmationPocEvent {
            trigger_height: 1_500,
            phase: ConfirmationPhase::Generation,
            batch_window_start: 1_500,
            batch_window_end: 1_520,
        };
        assert!(ev.contains(1_500));
        assert!(ev.contains(1_520));
        assert!(!ev.contains(1_521));
    }
}
