//! # Casper-Core Node
//!
//! Startup sequence:
//!
//! 1. Initialize telemetry from `CC_LOG_LEVEL` / `CC_JSON_LOGS`
//! 2. Load `NodeConfig` from `CC_*` variables
//! 3. Build genesis and every subsystem
//! 4. Spawn the admission queue, finalization loop and proposer
//! 5. Run until ctrl-c, then shut down gracefully

use anyhow::{Context, Result};
use casper_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env().context("Invalid node configuration")?;
    info!(
        max_parents = config.fork_choice.max_parents,
        threshold = %config.finality.threshold,
        tick_ms = config.finality.tick_interval.as_millis() as u64,
        proposing = config.proposer.signing_key.is_some(),
        "Configuration loaded"
    );

    let runtime = NodeRuntime::start(config).context("Failed to start node")?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    runtime.shutdown().await;
    Ok(())
}
