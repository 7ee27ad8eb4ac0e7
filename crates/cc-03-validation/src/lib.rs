//! # cc-03-validation
//!
//! Block admission pipeline for Casper-Core.
//!
//! ## Architecture
//!
//! Every candidate block, whether received from a peer or produced locally,
//! goes through six stages in a fixed order. Cheap structural checks run
//! first; the execution engine is only consulted for blocks that are well
//! formed, correctly signed and complete.
//!
//! ```text
//!  block ─→ [1 format] ─→ [2 crypto] ─→ [3 consensus] ─→ [4 dependencies]
//!                                                            │ missing → Pending
//!                                                            ↓
//!           Admitted ←─ DagStore::update ←─ [6 byzantine] ←─ [5 state transition]
//! ```
//!
//! Any failing stage produces a terminal `Rejected(reason)`; a missing
//! dependency produces `Pending(missing)`, which the caller retries once
//! the dependencies arrive. Equivocations are admitted and remembered,
//! never rejected.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_03_validation::{
//!     BlockAdmission, HashChainExecutionEngine, Secp256k1Blake3Provider,
//!     ValidationConfig, ValidationDependencies, ValidationPipeline,
//! };
//!
//! let pipeline = ValidationPipeline::new(ValidationDependencies {
//!     crypto: Arc::new(Secp256k1Blake3Provider),
//!     engine: Arc::new(HashChainExecutionEngine),
//!     config: ValidationConfig::default(),
//! });
//! let outcome = pipeline.admit(block, &store).await;
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{HashChainExecutionEngine, Secp256k1Blake3Provider};
pub use domain::{
    AdmissionOutcome, AdmittedBlock, ByzantineViolation, ClassifiedEquivocation,
    ConsensusViolation, CryptoViolation, EquivocationClass, FormatViolation, Halt, PreValidated,
    RejectCategory, RejectReason, StateTransitionViolation, ValidationAdvisory, ValidationConfig,
    SIGNATURE_LEN,
};
pub use ports::{
    BlockAdmission, CryptoProvider, ExecutionEngine, ExecutionError, SystemTimeSource, TimeSource,
};
pub use service::{ValidationDependencies, ValidationPipeline};
