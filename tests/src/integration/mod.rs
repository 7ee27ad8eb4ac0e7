//! # Integration Tests
//!
//! Cross-crate flows. Each module is test-only.

#[cfg(test)]
mod byzantine;
#[cfg(test)]
mod node;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
