//! Collaborators for nodes that keep all state in memory.

use async_trait::async_trait;
use shared_types::{short_hex, BlockHash, StateHash};
use tracing::debug;

use crate::error::FinalityResult;
use crate::ports::outbound::{BlockPruner, ExecutionStateNotifier};

/// Logs finalized states; nothing to release.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStateNotifier;

#[async_trait]
impl ExecutionStateNotifier for TracingStateNotifier {
    async fn on_finalized(&self, block: BlockHash, post_state: StateHash) -> FinalityResult<()> {
        debug!(
            block = %short_hex(&block),
            post_state = %short_hex(&post_state),
            "Finalized state"
        );
        Ok(())
    }
}

/// Keeps every block: the DAG never drops history.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPruner;

#[async_trait]
impl BlockPruner for NoopPruner {
    async fn prune_below(&self, height: u64) -> FinalityResult<()> {
        debug!(height, "Pruning skipped");
        Ok(())
    }
}
