//! Finalization events.

use shared_types::BlockHash;

/// Published once per newly finalized block, ascending by height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedBlockEvent {
    pub block_hash: BlockHash,
    pub height: u64,
}
