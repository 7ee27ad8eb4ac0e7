//! # Finality Metrics
//!
//! Prometheus metrics for the safety oracle and finalization loop.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cc-04-finality = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `finality_blocks_finalized_total` - Counter of finalized blocks
//! - `finality_last_finalized_height` - Gauge of the last finalized height
//! - `finality_oracle_duration_seconds` - Histogram of oracle scan times
//! - `finality_oracle_timeouts_total` - Counter of abandoned oracle scans
//! - `finality_side_effect_failures_total` - Counter of failed side effects (by collaborator)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_int_counter, CounterVec,
    Gauge, Histogram, IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks finalized
    pub static ref BLOCKS_FINALIZED: IntCounter = register_int_counter!(
        "finality_blocks_finalized_total",
        "Total number of blocks finalized"
    )
    .expect("Failed to create BLOCKS_FINALIZED metric");

    /// Height of the last finalized block
    pub static ref LAST_FINALIZED_HEIGHT: Gauge = register_gauge!(
        "finality_last_finalized_height",
        "Height of the last finalized block"
    )
    .expect("Failed to create LAST_FINALIZED_HEIGHT metric");

    /// Histogram of oracle scan latency
    pub static ref ORACLE_DURATION: Histogram = register_histogram!(
        "finality_oracle_duration_seconds",
        "Time taken by one safety oracle scan in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to create ORACLE_DURATION metric");

    /// Total oracle scans cancelled at the timeout
    pub static ref ORACLE_TIMEOUTS: IntCounter = register_int_counter!(
        "finality_oracle_timeouts_total",
        "Total number of oracle scans cancelled at the timeout"
    )
    .expect("Failed to create ORACLE_TIMEOUTS metric");

    /// Total failed side effects, labeled by collaborator
    pub static ref SIDE_EFFECT_FAILURES: CounterVec = register_counter_vec!(
        "finality_side_effect_failures_total",
        "Total number of finalization side effects that failed",
        &["collaborator"]
    )
    .expect("Failed to create SIDE_EFFECT_FAILURES metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record newly finalized blocks and the new finalized height
#[cfg(feature = "metrics")]
pub fn record_finalized(count: u64, height: u64) {
    BLOCKS_FINALIZED.inc_by(count);
    LAST_FINALIZED_HEIGHT.set(height as f64);
}

#[cfg(feature = "metrics")]
pub fn record_oracle_duration(seconds: f64) {
    ORACLE_DURATION.observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn record_oracle_timeout() {
    ORACLE_TIMEOUTS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_side_effect_failure(collaborator: &str) {
    SIDE_EFFECT_FAILURES.with_label_values(&[collaborator]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_finalized(_count: u64, _height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_oracle_duration(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_oracle_timeout() {}

#[cfg(not(feature = "metrics"))]
pub fn record_side_effect_failure(_collaborator: &str) {}
