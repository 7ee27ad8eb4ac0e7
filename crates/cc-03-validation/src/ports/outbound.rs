//! Driven ports (Outbound dependencies)
//!
//! The pipeline invokes hashing, signature checks and state execution but
//! owns none of them.

use async_trait::async_trait;
use shared_types::{Deploy, DeployHash, Hash, StateHash, ValidatorId};
use thiserror::Error;

/// Hashing and signature verification.
///
/// Synchronous: both are CPU-bound and called inline by stage 2.
pub trait CryptoProvider: Send + Sync {
    /// Content hash of `data`.
    fn hash(&self, data: &[u8]) -> Hash;

    /// True when `signature` over `message` was produced by `signer`.
    fn verify(&self, signer: &ValidatorId, message: &[u8], signature: &[u8]) -> bool;
}

/// Execution failures reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("No parent states to merge")]
    NothingToMerge,

    #[error("Deploy content does not match its hash: {0:?}")]
    InvalidDeploy(DeployHash),

    #[error("Execution engine error: {0}")]
    Engine(String),
}

/// Deploy execution and state merging.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Combine parent post-states, main parent first, into one pre-state.
    async fn merge_states(&self, parents: &[StateHash]) -> Result<StateHash, ExecutionError>;

    /// Apply `deploys` on top of `pre_state`.
    async fn execute(
        &self,
        pre_state: StateHash,
        deploys: &[Deploy],
    ) -> Result<StateHash, ExecutionError>;
}

/// Time source for timestamp validation
pub trait TimeSource: Send + Sync {
    /// Current unix time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
