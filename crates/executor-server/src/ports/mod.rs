pub mod outbound;

pub use outbound::{ArtifactAttributionSink, ChainQuery};
