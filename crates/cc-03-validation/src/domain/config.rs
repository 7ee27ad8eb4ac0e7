//! Validation limits.

use cc_01_block_dag::DEFAULT_MAX_TRAVERSAL_DEPTH;
use cc_02_fork_choice::DEFAULT_MAX_PARENTS;

/// Length of a secp256k1 `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

/// Configuration for block validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Maximum parents per block.
    pub max_parents: usize,
    /// Maximum deploys per block.
    pub max_deploys: usize,
    /// Maximum encoded block size.
    pub max_block_bytes: usize,
    /// Maximum timestamp drift allowed into the future (milliseconds).
    pub max_clock_drift_ms: u64,
    /// Compare declared parents against fork choice and report divergence.
    pub check_fork_choice: bool,
    /// Hop cap for the justification walk of the equivocation stage.
    pub max_traversal_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_parents: DEFAULT_MAX_PARENTS,
            max_deploys: 1_000,
            max_block_bytes: 4 * 1024 * 1024,
            max_clock_drift_ms: 15_000,
            check_fork_choice: true,
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
        }
    }
}
