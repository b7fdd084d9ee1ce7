pub mod inbound;
pub mod outbound;

pub use inbound::NodeBroker;
pub use outbound::WorkerTransport;
