//! # cc-02-fork-choice
//!
//! Fork-choice estimator for Casper-Core.
//!
//! ## Architecture
//!
//! Given a DAG snapshot, the estimator anchors at the latest common ancestor
//! of every bonded validator's latest message and ranks the blocks above it
//! by the stake that builds on them:
//!
//! ```text
//!   latest messages ──→ LCA ──→ score map ──→ frontier ranking ──→ parents
//!                     (deepest   (weight per   (-score, hash),      (ancestor-
//!                      shared     block above   top max_parents)     free)
//!                      ancestor)  the LCA)
//! ```
//!
//! Equivocators are not excluded: their weight is counted along every one of
//! their competing chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_02_fork_choice::{select_parents, DEFAULT_MAX_PARENTS};
//!
//! let parents = select_parents(&store.snapshot(), DEFAULT_MAX_PARENTS);
//! ```

pub mod domain;
pub mod ports;

pub use domain::{
    latest_common_ancestor, score_map, select_parents, voting_tips, Estimate, Estimator,
    ForkChoiceConfig, ScoreMap, DEFAULT_MAX_PARENTS,
};
pub use ports::ParentSelector;
