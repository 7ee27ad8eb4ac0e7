//! Fixture builders for DAG-shaped tests.
//!
//! Enable with the `test-utils` feature flag. Blocks produced here are
//! unsigned and their hashes are sequential, not content hashes, so they only
//! suit code that reads the DAG and never re-verifies blocks.

use std::collections::BTreeMap;

use shared_types::{Block, BlockHash, Stake, ValidatorId, VALIDATOR_ID_LEN};

use crate::domain::{BlockDag, DagConfig, InsertOutcome};
use crate::error::DagResult;

/// Hash of the genesis block built by [`genesis_block`].
pub const GENESIS_HASH: BlockHash = [0u8; 32];

/// Deterministic validator identity `n`.
pub fn validator(n: u8) -> ValidatorId {
    let mut bytes = [n; VALIDATOR_ID_LEN];
    bytes[0] = 0x02;
    ValidatorId(bytes)
}

/// Parentless block carrying `bonds`.
pub fn genesis_block(bonds: &[(ValidatorId, Stake)]) -> Block {
    Block {
        hash: GENESIS_HASH,
        sender: ValidatorId::GENESIS,
        seq_num: 0,
        parent_hashes: Vec::new(),
        justifications: BTreeMap::new(),
        timestamp: 0,
        pre_state_hash: [0u8; 32],
        post_state_hash: [0u8; 32],
        deploys: Vec::new(),
        bonds: bonds.iter().copied().collect(),
        signature: Vec::new(),
    }
}

/// Builds a [`BlockDag`] one block at a time.
///
/// Hashes increase with creation order, so the first block created has the
/// smallest hash.
pub struct DagBuilder {
    dag: BlockDag,
    bonds: BTreeMap<ValidatorId, Stake>,
    nonce: u64,
}

impl DagBuilder {
    pub fn new(bonds: &[(ValidatorId, Stake)]) -> Self {
        Self::with_config(bonds, DagConfig::default())
    }

    pub fn with_config(bonds: &[(ValidatorId, Stake)], config: DagConfig) -> Self {
        let dag = BlockDag::new(genesis_block(bonds), config).expect("valid genesis");
        Self {
            dag,
            bonds: bonds.iter().copied().collect(),
            nonce: 1,
        }
    }

    pub fn genesis(&self) -> BlockHash {
        *self.dag.genesis()
    }

    pub fn dag(&self) -> &BlockDag {
        &self.dag
    }

    pub fn dag_mut(&mut self) -> &mut BlockDag {
        &mut self.dag
    }

    pub fn into_dag(self) -> BlockDag {
        self.dag
    }

    /// Bonds stamped on subsequently built blocks.
    pub fn set_bonds(&mut self, bonds: &[(ValidatorId, Stake)]) {
        self.bonds = bonds.iter().copied().collect();
    }

    /// Insert the sender's next block, justifying each parent.
    pub fn block(&mut self, sender: ValidatorId, parents: &[BlockHash]) -> BlockHash {
        self.block_with_justifications(sender, parents, &[])
    }

    /// Insert the sender's next block, justifying each parent and each hash
    /// in `justifications`.
    pub fn block_with_justifications(
        &mut self,
        sender: ValidatorId,
        parents: &[BlockHash],
        justifications: &[BlockHash],
    ) -> BlockHash {
        let seq_num = self.next_seq_num(&sender);
        let block = self.make_block(sender, seq_num, parents, justifications);
        let hash = block.hash;
        self.insert(block).expect("fixture block inserts");
        hash
    }

    /// Insert a second block at an already used `seq_num`.
    pub fn equivocate(
        &mut self,
        sender: ValidatorId,
        seq_num: u64,
        parents: &[BlockHash],
        justifications: &[BlockHash],
    ) -> BlockHash {
        let block = self.make_block(sender, seq_num, parents, justifications);
        let hash = block.hash;
        self.insert(block).expect("fixture block inserts");
        hash
    }

    /// Build (without inserting) a block at `seq_num`.
    ///
    /// Justifications map every known parent and listed hash to its sender;
    /// the creator justification names the sender's block at `seq_num - 1`
    /// (smallest hash if several) or genesis for `seq_num == 0`.
    pub fn make_block(
        &mut self,
        sender: ValidatorId,
        seq_num: u64,
        parents: &[BlockHash],
        justifications: &[BlockHash],
    ) -> Block {
        let mut justified = BTreeMap::new();
        for target in parents.iter().chain(justifications) {
            if let Some(block) = self.dag.get(target) {
                if block.sender != ValidatorId::GENESIS {
                    justified.insert(block.sender, *target);
                }
            }
        }
        let previous = match seq_num {
            0 => Some(self.genesis()),
            n => self.dag.blocks_at(&sender, n - 1).first().copied(),
        };
        if let Some(previous) = previous {
            justified.insert(sender, previous);
        }

        let nonce = self.nonce;
        self.nonce += 1;
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&nonce.to_be_bytes());
        hash[8] = sender.as_bytes()[1];
        hash[31] = 0xFF;

        Block {
            hash,
            sender,
            seq_num,
            parent_hashes: parents.to_vec(),
            justifications: justified,
            timestamp: nonce * 1_000,
            pre_state_hash: [0u8; 32],
            post_state_hash: [0u8; 32],
            deploys: Vec::new(),
            bonds: self.bonds.clone(),
            signature: Vec::new(),
        }
    }

    pub fn insert(&mut self, block: Block) -> DagResult<InsertOutcome> {
        self.dag.insert(block)
    }

    /// Finalize `hash`, returning the newly finalized blocks.
    pub fn finalize(&mut self, hash: BlockHash) -> Vec<BlockHash> {
        self.dag.mark_finalized(&hash).expect("fixture finalization")
    }

    fn next_seq_num(&self, sender: &ValidatorId) -> u64 {
        self.dag
            .latest_message(sender)
            .map(|latest| {
                latest
                    .hashes()
                    .iter()
                    .filter_map(|h| self.dag.get(h).map(|b| b.seq_num))
                    .max()
                    .unwrap_or(0)
                    + 1
            })
            .unwrap_or(0)
    }
}
