//! Adapters layer (Hexagonal Architecture)
//!
//! Concrete crypto and execution backends for the outbound ports.

mod crypto;
mod execution;

pub use crypto::*;
pub use execution::*;
