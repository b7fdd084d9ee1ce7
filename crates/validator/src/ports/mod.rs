pub mod outbound;

pub use outbound::{
    ExecutorClient, ExecutorPayloadResponse, NodeLeasing, ReplayRequest, ReplayResponse,
    ValidationChainQuery, WorkerReplayClient,
};
