//! # cc-01-block-dag
//!
//! Block DAG subsystem for Casper-Core.
//!
//! ## Architecture
//!
//! The DAG is the single source of truth every other consensus subsystem
//! reads. It holds admitted blocks and the indices derived from them:
//!
//! ```text
//!                  ┌──────────────── BlockDag ────────────────┐
//!  insert(block) ─→│ blocks · children · heights              │
//!                  │ latest messages · equivocations          │
//!  mark_finalized →│ finalized set · last finalized · weights │
//!                  └──────────────────────────────────────────┘
//!                        ↑ snapshot()              ↑ update()
//!              [Fork Choice] [Finality]     [Validation Pipeline]
//! ```
//!
//! ## Invariants
//!
//! - Every stored non-genesis block's parents and justification targets are
//!   stored (no dangling references).
//! - The finalized set only grows and is closed under ancestry.
//! - Weights change only when a block is finalized.
//! - Equivocation records are never removed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_01_block_dag::{BlockDag, DagConfig, DagStore};
//!
//! let store = DagStore::new(BlockDag::new(genesis, DagConfig::default())?);
//! store.update(|dag| dag.insert(block))?;
//! let snapshot = store.snapshot();
//! ```

pub mod domain;
pub mod error;
pub mod store;

/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::{
    Ancestry, BlockDag, DagConfig, EquivocationEvidence, InsertOutcome, LatestMessage,
    ValidatorWeights, DEFAULT_MAX_TRAVERSAL_DEPTH,
};
pub use error::{DagError, DagResult};
pub use store::DagStore;
