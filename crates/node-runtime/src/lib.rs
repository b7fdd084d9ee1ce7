//! # Node Runtime
//!
//! The binary wiring layer: builds one process-wide instance of every
//! component (artifact store, payload store, phase tracker, chain client,
//! node broker, commit worker, executor server, validator), connects them
//! through the ports each exposes, and owns the background tasks that
//! drive them forward.
//!
//! `main.rs` is a thin shell over this library: load config, build a
//! [`container::Container`], spawn its tasks, wait for Ctrl+C, shut down.

pub mod attribution;
pub mod config;
pub mod container;
