pub mod inbound;
pub mod outbound;

pub use inbound::DurableLog;
pub use outbound::DurableLogBackend;
