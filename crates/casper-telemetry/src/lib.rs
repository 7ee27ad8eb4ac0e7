//! # Casper Telemetry
//!
//! Logging and metrics exposition shared by the Casper-Core binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use casper_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     tracing::info!("node starting");
//!     println!("{}", casper_telemetry::render_metrics()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CC_SERVICE_NAME` | `casper-core` | Service name in logs |
//! | `CC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `CC_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `CC_LOG_TARGET` | `true` | Include module targets |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    render_metrics, HistogramTimer, ADMISSION_EVICTED, ADMISSION_PENDING, BLOCKS_PROPOSED,
    DAG_BLOCKS, DAG_MAX_HEIGHT, PROPOSE_DURATION,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and touch the node-level metrics so they appear in the
/// first scrape.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    lazy_static::initialize(&DAG_BLOCKS);
    lazy_static::initialize(&DAG_MAX_HEIGHT);
    lazy_static::initialize(&ADMISSION_PENDING);
    lazy_static::initialize(&ADMISSION_EVICTED);
    lazy_static::initialize(&BLOCKS_PROPOSED);
    lazy_static::initialize(&PROPOSE_DURATION);
    tracing::info!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}
