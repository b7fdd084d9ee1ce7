//! Commands accepted by a node's single-consumer queue. Every command
//! carries enough information for the FSM guard to decide whether an
//! ML-worker call is even necessary.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCommand {
    StartPoC { v2: bool },
    InitValidate { v2: bool },
    StopNode,
    InitInference,
    StatusQuery,
}
