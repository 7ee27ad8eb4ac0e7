//! # cc-04-finality
//!
//! Safety oracle and finalization loop for Casper-Core.
//!
//! ## Architecture
//!
//! A block is safe when a group of validators that all build on it have
//! also seen each other build on it. The oracle measures that group:
//!
//! ```text
//!   target ──→ supporters ──→ agreement graph ──→ heaviest clique ──→ fault tolerance
//!              (latest tips    (mutual sight of    (exact ≤ cutoff,    (2·clique − total)
//!               descend from    committed blocks)   greedy above)        / total
//!               target)
//! ```
//!
//! The finalization loop runs the oracle off the async workers under a
//! timeout that cancels overrunning scans, finalizes at most one block per
//! tick, and then:
//!
//! - removes the included deploys from the deploy pool,
//! - tells execution the finalized post-state,
//! - optionally prunes blocks far below the finalized height,
//! - publishes one [`FinalizedBlockEvent`] per newly finalized block.
//!
//! Side-effect failures are logged and never undo finality.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_04_finality::{FinalityConfig, FinalityDependencies, FinalityService, InMemoryDeployPool};
//!
//! let service = Arc::new(FinalityService::new(FinalityDependencies {
//!     store,
//!     deploy_pool: Arc::new(InMemoryDeployPool::new()),
//!     notifier: Arc::new(TracingStateNotifier),
//!     pruner: Arc::new(NoopPruner),
//!     config: FinalityConfig::default(),
//! }));
//! let mut events = service.subscribe();
//! tokio::spawn(async move { service.run(shutdown_rx).await });
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryDeployPool, NoopPruner, TracingStateNotifier};
pub use domain::{
    fault_tolerance, finalize, supporters, CliqueMethod, FaultTolerance,
    ParseFaultToleranceError, SafetyOracle, SafetyReport, ScanCancel, ScanCancelled,
    WeightedClique,
    DEFAULT_EXACT_CLIQUE_MAX_VALIDATORS,
};
pub use error::{FinalityError, FinalityResult};
pub use events::FinalizedBlockEvent;
pub use ports::{BlockPruner, DeployPool, ExecutionStateNotifier, FinalityApi};
pub use service::{FinalityConfig, FinalityDependencies, FinalityService};
