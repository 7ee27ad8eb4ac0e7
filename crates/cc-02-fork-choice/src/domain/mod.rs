//! Domain layer for the Fork Choice subsystem
//!
//! - lca: latest common ancestor of all latest messages
//! - scoring: stake-weighted score map above the LCA
//! - estimator: ranked, ancestor-free parent selection

mod estimator;
mod lca;
mod scoring;

pub use estimator::*;
pub use lca::*;
pub use scoring::*;
