//! Adapters layer (Hexagonal Architecture)

mod deploy_pool;
mod noop;

pub use deploy_pool::*;
pub use noop::*;
