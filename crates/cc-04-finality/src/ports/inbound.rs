//! Driving Ports (API - Inbound)

use async_trait::async_trait;
use shared_types::BlockHash;
use tokio::sync::broadcast;

use crate::domain::FaultTolerance;
use crate::error::FinalityResult;
use crate::events::FinalizedBlockEvent;

/// Primary Finality API
#[async_trait]
pub trait FinalityApi: Send + Sync {
    /// Search for one finalization candidate and, if found, finalize it with
    /// all its ancestors. Returns the events emitted.
    async fn run_once(&self) -> FinalityResult<Vec<FinalizedBlockEvent>>;

    /// Fault tolerance of `block` on the current snapshot.
    async fn fault_tolerance(&self, block: BlockHash) -> FinalityResult<FaultTolerance>;

    /// Stream of finalization events.
    fn subscribe(&self) -> broadcast::Receiver<FinalizedBlockEvent>;
}
