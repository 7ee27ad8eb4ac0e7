//! # Validation Metrics
//!
//! Prometheus metrics for the admission pipeline.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cc-03-validation = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `validation_blocks_admitted_total` - Counter of admitted blocks
//! - `validation_blocks_pending_total` - Counter of blocks parked on missing dependencies
//! - `validation_blocks_rejected_total` - Counter of rejected blocks (by category)
//! - `validation_latency_seconds` - Histogram of admission times
//! - `validation_equivocations_total` - Counter of classified competing blocks (by class)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks admitted into the DAG
    pub static ref BLOCKS_ADMITTED: IntCounter = register_int_counter!(
        "validation_blocks_admitted_total",
        "Total number of blocks admitted into the DAG"
    )
    .expect("Failed to create BLOCKS_ADMITTED metric");

    /// Total blocks parked on missing dependencies
    pub static ref BLOCKS_PENDING: IntCounter = register_int_counter!(
        "validation_blocks_pending_total",
        "Total number of blocks returned as pending"
    )
    .expect("Failed to create BLOCKS_PENDING metric");

    /// Total blocks rejected, labeled by category
    pub static ref BLOCKS_REJECTED: CounterVec = register_counter_vec!(
        "validation_blocks_rejected_total",
        "Total number of blocks rejected",
        &["category"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    /// Histogram of admission latency
    pub static ref VALIDATION_LATENCY: Histogram = register_histogram!(
        "validation_latency_seconds",
        "Time taken to run a block through the pipeline in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to create VALIDATION_LATENCY metric");

    /// Competing blocks classified, labeled admissible / ignorable
    pub static ref EQUIVOCATIONS: CounterVec = register_counter_vec!(
        "validation_equivocations_total",
        "Total number of competing blocks classified",
        &["class"]
    )
    .expect("Failed to create EQUIVOCATIONS metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_admitted() {
    BLOCKS_ADMITTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_pending() {
    BLOCKS_PENDING.inc();
}

/// Record a rejected block with its category
#[cfg(feature = "metrics")]
pub fn record_block_rejected(category: &str) {
    BLOCKS_REJECTED.with_label_values(&[category]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_validation_latency(seconds: f64) {
    VALIDATION_LATENCY.observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn record_equivocation(class: &str) {
    EQUIVOCATIONS.with_label_values(&[class]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_admitted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_pending() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_category: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_validation_latency(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_equivocation(_class: &str) {}
