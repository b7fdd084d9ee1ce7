pub mod entities;
pub mod errors;

pub use entities::{DurableEnvelope, InFlightBatch, PendingBatch, QueuedMessage};
pub use errors::ChainClientError;
