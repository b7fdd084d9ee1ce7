pub mod mock;

pub use mock::MockWorkerTransport;
