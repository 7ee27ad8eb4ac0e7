//! # Error Types
//!
//! Errors raised while constructing shared types from external input.

use thiserror::Error;

/// Errors that can occur when parsing shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Input was not valid hex.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded input had the wrong length.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
