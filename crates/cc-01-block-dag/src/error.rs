//! # DAG Errors
//!
//! Each variant maps to a structural rule the DAG refuses to break.

use shared_types::{short_hex, BlockHash};
use thiserror::Error;

/// Errors raised by [`crate::BlockDag`] mutations and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    /// Block with this hash is already stored.
    #[error("Block already exists: {}", short_hex(.hash))]
    AlreadyExists { hash: BlockHash },

    /// Block refers to parents or justifications the DAG does not hold.
    #[error("Block {} has {} missing dependencies", short_hex(.hash), .missing.len())]
    MissingDependencies {
        hash: BlockHash,
        missing: Vec<BlockHash>,
    },

    /// Genesis block is malformed, or a second genesis was offered.
    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    /// Lookup of a block the DAG does not hold.
    #[error("Unknown block: {}", short_hex(.hash))]
    UnknownBlock { hash: BlockHash },

    /// Finalizing this block would revert the last finalized block.
    #[error(
        "Block {} does not descend from last finalized {}",
        short_hex(.hash),
        short_hex(.last_finalized)
    )]
    FinalityConflict {
        hash: BlockHash,
        last_finalized: BlockHash,
    },
}

/// Result type for DAG operations.
pub type DagResult<T> = Result<T, DagError>;
