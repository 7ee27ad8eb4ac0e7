//! Driver ports (Inbound API)

use async_trait::async_trait;
use cc_01_block_dag::DagStore;
use shared_types::Block;

use crate::domain::AdmissionOutcome;

/// Entry point for blocks arriving from the network or produced locally.
#[async_trait]
pub trait BlockAdmission: Send + Sync {
    /// Run every validation stage and, on success, append to the DAG.
    ///
    /// Concurrent calls are safe: the equivocation stage is re-evaluated
    /// against the DAG being written. Callers that care about admission order
    /// should still serialize through one queue, as `AdmissionQueue` does.
    async fn admit(&self, block: Block, store: &DagStore) -> AdmissionOutcome;
}
