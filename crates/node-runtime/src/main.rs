//! # Node Runtime
//!
//! Process entry point: initialize telemetry, load configuration, build
//! the component container, and run until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::Result;
use node_runtime::config::RuntimeConfig;
use node_runtime::container::Container;
use node_telemetry::TelemetryConfig;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::for_component("runtime", "node-runtime");
    let _telemetry = node_telemetry::init_telemetry(telemetry_config).await?;

    tracing::info!("loading configuration");
    let config = RuntimeConfig::from_env();

    tracing::info!(listen_addr = %config.node.listen_addr, "building component container");
    let container = Arc::new(Container::build(config).await?);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let run_handle = tokio::spawn(container.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    if let Err(e) = run_handle.await {
        tracing::error!(error = %e, "container task panicked during shutdown");
    }

    tracing::info!("node runtime stopped");
    Ok(())
}
