//! Domain layer for the Finality subsystem
//!
//! - cancel: cooperative cancellation of long scans
//! - fault_tolerance: exact `[-1, 1]` safety values
//! - clique: exact and greedy maximum weighted clique
//! - oracle: supporters, agreement graph and finalization candidate search

mod cancel;
mod clique;
mod fault_tolerance;
mod oracle;

pub use cancel::*;
pub use clique::*;
pub use fault_tolerance::*;
pub use oracle::*;
