pub mod acceptance;
pub mod distribution;

pub use acceptance::{
    current_stage_height, should_accept_generated_artifacts, should_accept_store_commit,
    should_accept_validated_artifacts, should_have_distributed_weights,
};
pub use distribution::distribute_weights;
