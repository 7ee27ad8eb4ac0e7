//! In-memory deploy pool.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Deploy, DeployHash};
use tracing::debug;

use crate::error::FinalityResult;
use crate::ports::outbound::DeployPool;

/// Deploys in arrival order, deduplicated by hash.
#[derive(Default)]
pub struct InMemoryDeployPool {
    deploys: RwLock<Vec<Deploy>>,
}

impl InMemoryDeployPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a deploy. Returns false if it is already pooled.
    pub fn add(&self, deploy: Deploy) -> bool {
        let mut deploys = self.deploys.write();
        if deploys.iter().any(|d| d.hash == deploy.hash) {
            return false;
        }
        deploys.push(deploy);
        true
    }

    /// Up to `limit` oldest deploys, left in the pool.
    pub fn pending(&self, limit: usize) -> Vec<Deploy> {
        self.deploys.read().iter().take(limit).cloned().collect()
    }

    pub fn contains(&self, hash: &DeployHash) -> bool {
        self.deploys.read().iter().any(|d| d.hash == *hash)
    }

    pub fn len(&self) -> usize {
        self.deploys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deploys.read().is_empty()
    }
}

#[async_trait]
impl DeployPool for InMemoryDeployPool {
    async fn remove(&self, hashes: &[DeployHash]) -> FinalityResult<()> {
        let finalized: HashSet<_> = hashes.iter().collect();
        let mut deploys = self.deploys.write();
        let before = deploys.len();
        deploys.retain(|d| !finalized.contains(&d.hash));
        debug!(
            removed = before - deploys.len(),
            remaining = deploys.len(),
            "Finalized deploys removed from pool"
        );
        Ok(())
    }
}
