//! Deterministic hash-chain execution engine.
//!
//! State is an opaque 32-byte digest. Merging parent states and applying a
//! deploy are both domain-separated BLAKE3 hashes, so any two nodes that
//! agree on inputs agree on every state hash.

use async_trait::async_trait;
use shared_crypto::{blake3_hash, blake3_hash_many};
use shared_types::{Deploy, StateHash};

use crate::ports::{ExecutionEngine, ExecutionError};

const MERGE_CONTEXT: &str = "casper-core 2024 state merge";
const EXECUTE_CONTEXT: &str = "casper-core 2024 deploy execution";

/// [`ExecutionEngine`] that folds deploy hashes into the state digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashChainExecutionEngine;

impl HashChainExecutionEngine {
    /// Merge parent states, main parent first. A single parent passes
    /// through unchanged.
    pub fn merge(parents: &[StateHash]) -> Result<StateHash, ExecutionError> {
        match parents {
            [] => Err(ExecutionError::NothingToMerge),
            [single] => Ok(*single),
            many => {
                let inputs: Vec<&[u8]> = many.iter().map(|s| s.as_slice()).collect();
                Ok(blake3_hash_many(MERGE_CONTEXT, &inputs))
            }
        }
    }

    /// Apply deploys in order. A deploy whose hash does not match its
    /// payload is refused.
    pub fn apply(pre_state: StateHash, deploys: &[Deploy]) -> Result<StateHash, ExecutionError> {
        deploys.iter().try_fold(pre_state, |state, deploy| {
            if blake3_hash(&deploy.payload) != deploy.hash {
                return Err(ExecutionError::InvalidDeploy(deploy.hash));
            }
            Ok(blake3_hash_many(EXECUTE_CONTEXT, &[&state, &deploy.hash]))
        })
    }
}

#[async_trait]
impl ExecutionEngine for HashChainExecutionEngine {
    async fn merge_states(&self, parents: &[StateHash]) -> Result<StateHash, ExecutionError> {
        Self::merge(parents)
    }

    async fn execute(
        &self,
        pre_state: StateHash,
        deploys: &[Deploy],
    ) -> Result<StateHash, ExecutionError> {
        Self::apply(pre_state, deploys)
    }
}
