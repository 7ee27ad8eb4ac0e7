//! # Inbound Ports
//!
//! API other subsystems use to ask for parents.

use cc_01_block_dag::BlockDag;
use shared_types::BlockHash;

use crate::domain::Estimator;

/// Parent selection over a DAG snapshot.
///
/// Block production calls this to pick parents for its own block; the
/// validation pipeline calls it to cross-check a peer's declared parents.
pub trait ParentSelector: Send + Sync {
    /// Parents for a new block, main parent first. Never empty.
    fn select_parents(&self, dag: &BlockDag) -> Vec<BlockHash>;
}

impl ParentSelector for Estimator {
    fn select_parents(&self, dag: &BlockDag) -> Vec<BlockHash> {
        Estimator::select_parents(self, dag)
    }
}
