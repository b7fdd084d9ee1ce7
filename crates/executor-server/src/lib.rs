//! # Executor Server
//!
//! The executor's own HTTP surface: a validator-facing payload and PoC
//! inclusion-proof API, and an ML-worker-facing callback endpoint for V2
//! PoC artifacts. Authz decisions (which pubkeys may sign on a validator's
//! behalf) are cached with a short TTL; everything else is a thin
//! translation from HTTP onto the ports the rest of the workspace exposes.

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::ExecutorServerState;
