//! Validator weights, sourced from the bonds of the last finalized block.

use std::collections::BTreeMap;

use shared_types::{BlockHash, Stake, ValidatorId};

/// Stake table in force for fork choice and finality.
///
/// Replaced as a whole when a new block is finalized; `version` increases by
/// one on every replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorWeights {
    version: u64,
    source: BlockHash,
    weights: BTreeMap<ValidatorId, Stake>,
    total: u128,
}

impl ValidatorWeights {
    /// Build the table from a block's bonds.
    pub fn new(version: u64, source: BlockHash, bonds: &BTreeMap<ValidatorId, Stake>) -> Self {
        let weights: BTreeMap<_, _> = bonds
            .iter()
            .filter(|(_, stake)| **stake > 0)
            .map(|(v, s)| (*v, *s))
            .collect();
        let total = weights.values().map(|s| *s as u128).sum();
        Self {
            version,
            source,
            weights,
            total,
        }
    }

    /// Monotone version number, 0 for the genesis table.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Finalized block whose bonds this table was built from.
    pub fn source(&self) -> &BlockHash {
        &self.source
    }

    /// Weight of a validator; 0 when unbonded.
    pub fn weight_of(&self, validator: &ValidatorId) -> Stake {
        self.weights.get(validator).copied().unwrap_or(0)
    }

    /// Sum of all weights.
    pub fn total(&self) -> u128 {
        self.total
    }

    pub fn is_bonded(&self, validator: &ValidatorId) -> bool {
        self.weights.contains_key(validator)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ValidatorId, &Stake)> {
        self.weights.iter()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
