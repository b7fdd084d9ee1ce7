pub mod mock;

pub use mock::{MockChainQuery, NullAttributionSink};
