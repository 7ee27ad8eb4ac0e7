//! Signed block fixtures.
//!
//! Enable with the `test-utils` feature flag. Unlike the DAG crate's
//! builder, blocks built here carry real content hashes, signatures and
//! execution states, so they pass every pipeline stage unless a test breaks
//! them on purpose.

use std::collections::BTreeMap;

use cc_01_block_dag::{BlockDag, DagConfig, DagStore};
use shared_crypto::{blake3_hash, Secp256k1KeyPair};
use shared_types::{Block, BlockHash, Deploy, Stake, ValidatorId};

use crate::adapters::HashChainExecutionEngine;
use crate::ports::TimeSource;

/// Clock that always reads the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub u64);

impl TimeSource for FixedTimeSource {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Deploy whose hash matches its payload.
pub fn deploy(payload: &[u8]) -> Deploy {
    Deploy {
        hash: blake3_hash(payload),
        payload: payload.to_vec(),
    }
}

/// A validator identity with its signing key.
pub struct SigningValidator {
    pub id: ValidatorId,
    keypair: Secp256k1KeyPair,
}

impl SigningValidator {
    /// Deterministic key derived from `seed` (must be non-zero).
    pub fn new(seed: u8) -> Self {
        let keypair = Secp256k1KeyPair::from_bytes([seed; 32]).expect("non-zero seed is a valid key");
        let id = ValidatorId(*keypair.public_key().as_bytes());
        Self { id, keypair }
    }

    /// Recompute `block.hash` from its content and sign it.
    pub fn seal(&self, block: &mut Block) {
        block.hash = blake3_hash(&block.content_bytes());
        block.signature = self.keypair.sign(&block.hash).to_vec();
    }
}

/// Builds valid, signed blocks against a DAG snapshot.
pub struct BlockFactory {
    validators: Vec<SigningValidator>,
    bonds: BTreeMap<ValidatorId, Stake>,
    clock: u64,
}

impl BlockFactory {
    /// One validator per stake, seeded `1..=n`.
    pub fn new(stakes: &[Stake]) -> Self {
        let validators: Vec<_> = (1..=stakes.len())
            .map(|seed| SigningValidator::new(seed as u8))
            .collect();
        let bonds = validators
            .iter()
            .zip(stakes)
            .map(|(v, stake)| (v.id, *stake))
            .collect();
        Self {
            validators,
            bonds,
            clock: 1_000,
        }
    }

    pub fn validator(&self, index: usize) -> ValidatorId {
        self.validators[index].id
    }

    pub fn signer(&self, index: usize) -> &SigningValidator {
        &self.validators[index]
    }

    /// Current fixture time; every built block advances it by one second.
    pub fn now(&self) -> u64 {
        self.clock
    }

    pub fn genesis(&self) -> Block {
        let mut genesis = Block {
            hash: [0u8; 32],
            sender: ValidatorId::GENESIS,
            seq_num: 0,
            parent_hashes: Vec::new(),
            justifications: BTreeMap::new(),
            timestamp: 0,
            pre_state_hash: [0u8; 32],
            post_state_hash: blake3_hash(b"genesis state"),
            deploys: Vec::new(),
            bonds: self.bonds.clone(),
            signature: Vec::new(),
        };
        genesis.hash = blake3_hash(&genesis.content_bytes());
        genesis
    }

    pub fn store(&self) -> DagStore {
        DagStore::new(BlockDag::new(self.genesis(), DagConfig::default()).expect("valid genesis"))
    }

    /// Next block of `creator` on `parents`, justifying every latest
    /// message in `dag`.
    pub fn build(
        &mut self,
        dag: &BlockDag,
        creator: usize,
        parents: &[BlockHash],
        deploys: Vec<Deploy>,
    ) -> Block {
        let id = self.validator(creator);
        let mut justifications: BTreeMap<_, _> = dag
            .latest_messages()
            .map(|(validator, latest)| (validator, *latest.canonical()))
            .collect();
        let (seq_num, previous) = Self::next_in_sequence(dag, &id);
        justifications.insert(id, previous);
        self.build_with(dag, creator, seq_num, parents, justifications, deploys)
    }

    /// Block with every consensus field chosen by the caller. States are
    /// computed from `parents`, which must be in `dag`.
    pub fn build_with(
        &mut self,
        dag: &BlockDag,
        creator: usize,
        seq_num: u64,
        parents: &[BlockHash],
        justifications: BTreeMap<ValidatorId, BlockHash>,
        deploys: Vec<Deploy>,
    ) -> Block {
        let parent_states: Vec<_> = parents
            .iter()
            .filter_map(|p| dag.get(p).map(|b| b.post_state_hash))
            .collect();
        let pre_state_hash =
            HashChainExecutionEngine::merge(&parent_states).unwrap_or([0u8; 32]);
        let post_state_hash =
            HashChainExecutionEngine::apply(pre_state_hash, &deploys).expect("fixture deploys are valid");

        self.clock += 1_000;
        let mut block = Block {
            hash: [0u8; 32],
            sender: self.validator(creator),
            seq_num,
            parent_hashes: parents.to_vec(),
            justifications,
            timestamp: self.clock,
            pre_state_hash,
            post_state_hash,
            deploys,
            bonds: self.bonds.clone(),
            signature: Vec::new(),
        };
        self.validators[creator].seal(&mut block);
        block
    }

    /// Re-hash and re-sign a block after a test tampered with it.
    pub fn reseal(&self, creator: usize, block: &mut Block) {
        self.validators[creator].seal(block);
    }

    fn next_in_sequence(dag: &BlockDag, id: &ValidatorId) -> (u64, BlockHash) {
        let newest = dag.latest_message(id).and_then(|latest| {
            latest
                .hashes()
                .iter()
                .filter_map(|h| dag.get(h).map(|b| (b.seq_num, *h)))
                .min_by_key(|(seq, hash)| (std::cmp::Reverse(*seq), *hash))
        });
        match newest {
            Some((seq, hash)) => (seq + 1, hash),
            None => (0, *dag.genesis()),
        }
    }
}
