//! Error types for the Finality subsystem

use cc_01_block_dag::DagError;
use thiserror::Error;

use crate::domain::ScanCancelled;

/// Finality subsystem errors
#[derive(Debug, Error)]
pub enum FinalityError {
    /// The oracle scan overran its timeout and was cancelled; retried next tick
    #[error("Safety oracle exceeded {timeout_ms} ms")]
    OracleTimeout { timeout_ms: u64 },

    /// A timed-out scan is still winding down; retried next tick
    #[error("Previous safety oracle scan still running")]
    OracleBusy,

    /// The scan observed its cancel flag
    #[error(transparent)]
    Cancelled(#[from] ScanCancelled),

    /// The blocking oracle task panicked or was cancelled
    #[error("Safety oracle task failed: {reason}")]
    OracleTaskFailed { reason: String },

    /// The DAG refused to mark the candidate finalized
    #[error(transparent)]
    Dag(#[from] DagError),

    /// A finalization side effect failed
    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },
}

impl FinalityError {
    /// Retried on the next tick without operator attention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FinalityError::OracleTimeout { .. }
                | FinalityError::OracleBusy
                | FinalityError::Cancelled(_)
        )
    }
}

/// Result type for finality operations
pub type FinalityResult<T> = Result<T, FinalityError>;
