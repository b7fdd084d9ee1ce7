//! # Phase Tracker
//!
//! Holds the single authoritative, cached view of "where are we right
//! now": current epoch, current phase, and any in-flight confirmation PoC
//! event. Every other component reads this cache instead of recomputing
//! phase from raw block height, and the cache itself only changes in
//! response to a `BlockEvent` from `block-events`.

pub mod snapshot;
pub mod tracker;

pub use snapshot::PhaseSnapshot;
pub use tracker::PhaseTracker;
