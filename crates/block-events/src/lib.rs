//! # Block Events
//!
//! A narrow in-process broadcast bus carrying new-block notifications from
//! the chain client to the phase tracker (and anything else that cares
//! about block height without polling for it).

pub mod bus;
pub mod events;

pub use bus::{BlockEventBus, BusError, EventPublisher};
pub use events::BlockEvent;
