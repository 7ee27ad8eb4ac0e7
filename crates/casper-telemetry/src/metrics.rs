//! Node-level Prometheus metrics and text exposition.
//!
//! Library crates register their own counters in the default registry when
//! built with their `metrics` feature; [`render_metrics`] encodes all of
//! them together with the gauges below.
//!
//! All metrics follow the naming convention: `cc_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, register_histogram, register_int_counter, register_int_gauge, Encoder,
    Histogram, IntCounter, IntGauge, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    // =========================================================================
    // DAG
    // =========================================================================

    /// Blocks held by the DAG, genesis included
    pub static ref DAG_BLOCKS: IntGauge = register_int_gauge!(
        "cc_node_dag_blocks",
        "Number of blocks held by the DAG"
    ).expect("metric creation failed");

    /// Highest block height in the DAG
    pub static ref DAG_MAX_HEIGHT: IntGauge = register_int_gauge!(
        "cc_node_dag_max_height",
        "Highest block height in the DAG"
    ).expect("metric creation failed");

    // =========================================================================
    // ADMISSION
    // =========================================================================

    /// Blocks parked waiting for dependencies
    pub static ref ADMISSION_PENDING: IntGauge = register_int_gauge!(
        "cc_node_admission_pending_blocks",
        "Blocks buffered until their dependencies arrive"
    ).expect("metric creation failed");

    /// Pending blocks dropped because the buffer was full
    pub static ref ADMISSION_EVICTED: IntCounter = register_int_counter!(
        "cc_node_admission_evicted_total",
        "Pending blocks evicted from a full buffer"
    ).expect("metric creation failed");

    // =========================================================================
    // PROPOSER
    // =========================================================================

    /// Blocks built by this node
    pub static ref BLOCKS_PROPOSED: IntCounter = register_int_counter!(
        "cc_node_blocks_proposed_total",
        "Blocks proposed by this node"
    ).expect("metric creation failed");

    /// Time to build and sign a block
    pub static ref PROPOSE_DURATION: Histogram = register_histogram!(
        "cc_node_propose_duration_seconds",
        "Time spent building a block",
        exponential_buckets(0.0005, 2.0, 14).expect("bucket layout")
    ).expect("metric creation failed");
}

/// Encode every metric in the default registry as Prometheus text format.
pub fn render_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
