pub mod errors;
pub mod retry;
pub mod sampling;
pub mod scoring;

pub use errors::ValidatorError;
pub use retry::{is_epoch_stale, should_keep_retrying_lock, should_keep_retrying_payload};
pub use sampling::{detect_missed_validations, is_eligible, should_validate, InferenceSummary, ValidationParams};
pub use scoring::{score_replay, PositionLogits, ScoreOutcome, TopLogprobs};
