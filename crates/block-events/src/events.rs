//! The single event kind broadcast on the bus: a new block observed by
//! the chain client, carrying enough of the chain's block header for
//! subscribers to recompute their own derived state.

use node_types::Epoch;

#[derive(Debug, Clone, PartialEq)]
pub struct BlockEvent {
    pub height: u64,
    pub epoch: Epoch,
}
