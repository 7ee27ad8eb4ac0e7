//! # Genesis Block Builder
//!
//! Creates and validates the genesis block from the initial bonds.

use std::collections::BTreeMap;

use shared_crypto::{blake3_hash, blake3_hash_many};
use shared_types::{Block, Stake, ValidatorId};
use thiserror::Error;

const GENESIS_STATE_CONTEXT: &str = "casper-core 2024 genesis state";

/// Genesis block creation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenesisError {
    /// No validator carries stake.
    #[error("Genesis needs at least one bonded validator")]
    NoValidators,

    /// A validator is listed twice.
    #[error("Validator {0} bonded twice")]
    DuplicateValidator(ValidatorId),

    /// The reserved genesis sender cannot be bonded.
    #[error("Reserved genesis identity cannot be bonded")]
    ReservedIdentity,

    /// A bond could not be parsed.
    #[error("Invalid bond {input:?}: {reason}")]
    InvalidBond { input: String, reason: String },
}

/// Genesis block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenesisConfig {
    /// Initial validator set with stakes.
    pub bonds: Vec<(ValidatorId, Stake)>,

    /// Genesis timestamp (unix milliseconds).
    pub timestamp: u64,

    /// Network discriminator folded into the genesis state, so that two
    /// networks with the same validators have different genesis hashes.
    pub chain_name: String,
}

impl GenesisConfig {
    /// Parse `hex:stake` pairs separated by commas.
    pub fn parse_bonds(input: &str) -> Result<Vec<(ValidatorId, Stake)>, GenesisError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let invalid = |reason: String| GenesisError::InvalidBond {
                    input: entry.to_string(),
                    reason,
                };
                let (key, stake) = entry
                    .split_once(':')
                    .ok_or_else(|| invalid("expected <validator-hex>:<stake>".into()))?;
                let validator = ValidatorId::from_hex(key).map_err(|e| invalid(e.to_string()))?;
                let stake = stake
                    .trim()
                    .parse::<Stake>()
                    .map_err(|e| invalid(e.to_string()))?;
                Ok((validator, stake))
            })
            .collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        let mut seen = BTreeMap::new();
        for (validator, stake) in &self.bonds {
            if *validator == ValidatorId::GENESIS {
                return Err(GenesisError::ReservedIdentity);
            }
            if seen.insert(*validator, *stake).is_some() {
                return Err(GenesisError::DuplicateValidator(*validator));
            }
        }
        if !self.bonds.iter().any(|(_, stake)| *stake > 0) {
            return Err(GenesisError::NoValidators);
        }
        Ok(())
    }
}

/// Builder for creating genesis blocks.
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Build the genesis block.
    pub fn build(self) -> Result<Block, GenesisError> {
        self.config.validate()?;

        let bonds: BTreeMap<ValidatorId, Stake> = self.config.bonds.iter().copied().collect();
        let post_state_hash = genesis_state(&self.config.chain_name, &bonds);

        let mut genesis = Block {
            hash: [0u8; 32],
            sender: ValidatorId::GENESIS,
            seq_num: 0,
            parent_hashes: Vec::new(),
            justifications: BTreeMap::new(),
            timestamp: self.config.timestamp,
            pre_state_hash: [0u8; 32],
            post_state_hash,
            deploys: Vec::new(),
            bonds,
            signature: Vec::new(),
        };
        genesis.hash = blake3_hash(&genesis.content_bytes());
        Ok(genesis)
    }
}

fn genesis_state(chain_name: &str, bonds: &BTreeMap<ValidatorId, Stake>) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(bonds.len() * 41);
    for (validator, stake) in bonds {
        encoded.extend_from_slice(validator.as_bytes());
        encoded.extend_from_slice(&stake.to_be_bytes());
    }
    blake3_hash_many(GENESIS_STATE_CONTEXT, &[chain_name.as_bytes(), &encoded])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(n: u8) -> ValidatorId {
        let mut bytes = [n; 33];
        bytes[0] = 0x02;
        ValidatorId(bytes)
    }

    fn config() -> GenesisConfig {
        GenesisConfig {
            bonds: vec![(validator(1), 30), (validator(2), 70)],
            timestamp: 1_700_000_000_000,
            chain_name: "devnet".into(),
        }
    }

    #[test]
    fn test_genesis_shape() {
        let genesis = GenesisBuilder::new(config()).build().unwrap();

        assert!(genesis.is_genesis());
        assert!(genesis.justifications.is_empty());
        assert_eq!(genesis.sender, ValidatorId::GENESIS);
        assert_eq!(genesis.bonds.len(), 2);
        assert_eq!(genesis.hash, blake3_hash(&genesis.content_bytes()));
    }

    #[test]
    fn test_genesis_hash_deterministic() {
        let first = GenesisBuilder::new(config()).build().unwrap();
        let second = GenesisBuilder::new(config()).build().unwrap();
        assert_eq!(first.hash, second.hash);

        let other_chain = GenesisBuilder::new(GenesisConfig {
            chain_name: "testnet".into(),
            ..config()
        })
        .build()
        .unwrap();
        assert_ne!(first.hash, other_chain.hash);
        assert_ne!(first.post_state_hash, other_chain.post_state_hash);
    }

    #[test]
    fn test_config_validation() {
        let empty = GenesisConfig::default();
        assert_eq!(empty.validate(), Err(GenesisError::NoValidators));

        let duplicate = GenesisConfig {
            bonds: vec![(validator(1), 10), (validator(1), 20)],
            ..GenesisConfig::default()
        };
        assert_eq!(
            duplicate.validate(),
            Err(GenesisError::DuplicateValidator(validator(1)))
        );

        let reserved = GenesisConfig {
            bonds: vec![(ValidatorId::GENESIS, 10)],
            ..GenesisConfig::default()
        };
        assert_eq!(reserved.validate(), Err(GenesisError::ReservedIdentity));
    }

    #[test]
    fn test_parse_bonds() {
        let input = format!("{}:30, {}:70,", validator(1).to_hex(), validator(2).to_hex());
        let bonds = GenesisConfig::parse_bonds(&input).unwrap();
        assert_eq!(bonds, vec![(validator(1), 30), (validator(2), 70)]);

        assert!(matches!(
            GenesisConfig::parse_bonds("02aa:10"),
            Err(GenesisError::InvalidBond { .. })
        ));
        assert!(matches!(
            GenesisConfig::parse_bonds(&validator(1).to_hex()),
            Err(GenesisError::InvalidBond { .. })
        ));
    }
}
