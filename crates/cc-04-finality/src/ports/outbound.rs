//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Side effects of finalization. The service calls them after the DAG has
//! been updated; a failure is logged and does not undo finality.

use async_trait::async_trait;
use shared_types::{BlockHash, DeployHash, StateHash};

use crate::error::FinalityResult;

/// Pool of deploys waiting to be included in a block.
#[async_trait]
pub trait DeployPool: Send + Sync {
    /// Drop deploys that are now part of finalized history.
    async fn remove(&self, deploys: &[DeployHash]) -> FinalityResult<()>;
}

/// Execution engine hook for releasing intermediate state.
#[async_trait]
pub trait ExecutionStateNotifier: Send + Sync {
    /// `block` is final and `post_state` is the new finalized state.
    async fn on_finalized(&self, block: BlockHash, post_state: StateHash) -> FinalityResult<()>;
}

/// Storage pruning below a height.
#[async_trait]
pub trait BlockPruner: Send + Sync {
    async fn prune_below(&self, height: u64) -> FinalityResult<()>;
}
