//! Domain layer for the Validation subsystem
//!
//! - rules: pure checks for format, crypto and consensus stages
//! - byzantine: neglected-equivocation detection and classification
//! - outcome: admission results and advisories
//! - error: rejection taxonomy

mod byzantine;
mod config;
mod error;
mod outcome;
mod rules;

pub use byzantine::*;
pub use config::*;
pub use error::*;
pub use outcome::*;
pub use rules::*;
