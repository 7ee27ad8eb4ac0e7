//! Domain layer for the Block DAG subsystem
//!
//! - dag: block store, latest messages, equivocations, finality bookkeeping
//! - messages: latest-message view, insertion outcome, ancestry
//! - weights: validator stake table

mod dag;
mod messages;
mod weights;

pub use dag::*;
pub use messages::*;
pub use weights::*;
