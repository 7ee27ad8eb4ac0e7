//! # Casper-Core Test Suite
//!
//! Cross-crate tests that drive real signed blocks through validation,
//! the DAG, fork choice and finality.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Signed-block network harness
//! └── integration/
//!     ├── scenarios.rs  # Reference finality and admission scenarios
//!     ├── byzantine.rs  # Equivocation handling end to end
//!     ├── properties.rs # Finality monotonicity and bounds (proptest)
//!     └── node.rs       # NodeRuntime with the admission queue
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cc-tests
//! cargo bench -p cc-tests
//! ```

pub mod fixtures;
pub mod integration;
