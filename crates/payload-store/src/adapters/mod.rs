pub mod durable;
pub mod file;
pub mod hybrid;
pub mod null;

pub use durable::DurableBackend;
pub use file::FileBackend;
pub use hybrid::HybridBackend;
pub use null::NullDurableBackend;
