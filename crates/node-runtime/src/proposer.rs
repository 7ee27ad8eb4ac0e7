//! # Block Proposer
//!
//! Builds and signs this node's next block on top of the fork-choice
//! estimate. The result goes through the same admission path as any peer
//! block; nothing here writes to the DAG.

use std::collections::BTreeMap;
use std::sync::Arc;

use cc_01_block_dag::BlockDag;
use cc_02_fork_choice::ParentSelector;
use cc_03_validation::{CryptoProvider, ExecutionEngine, ExecutionError};
use shared_crypto::Secp256k1KeyPair;
use shared_types::{short_hex, Block, BlockHash, Deploy, ValidatorId};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposeError {
    #[error("Fork choice returned no parents")]
    NoParents,

    #[error("Parent {} is not in the DAG", short_hex(.0))]
    UnknownParent(BlockHash),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Creates blocks for one validator key.
pub struct BlockProposer<C, X> {
    keypair: Secp256k1KeyPair,
    validator: ValidatorId,
    crypto: Arc<C>,
    engine: Arc<X>,
    selector: Arc<dyn ParentSelector>,
}

impl<C, X> BlockProposer<C, X>
where
    C: CryptoProvider,
    X: ExecutionEngine,
{
    pub fn new(
        keypair: Secp256k1KeyPair,
        crypto: Arc<C>,
        engine: Arc<X>,
        selector: Arc<dyn ParentSelector>,
    ) -> Self {
        let validator = ValidatorId(*keypair.public_key().as_bytes());
        Self {
            keypair,
            validator,
            crypto,
            engine,
            selector,
        }
    }

    /// Identity the blocks are signed with.
    pub fn validator(&self) -> ValidatorId {
        self.validator
    }

    /// Build the next block carrying `deploys`, timestamped `now`.
    pub async fn propose(
        &self,
        dag: &BlockDag,
        deploys: Vec<Deploy>,
        now: u64,
    ) -> Result<Block, ProposeError> {
        let _timer = casper_telemetry::time_histogram!(casper_telemetry::PROPOSE_DURATION);

        let parent_hashes = self.selector.select_parents(dag);
        let main_parent = parent_hashes
            .first()
            .and_then(|hash| dag.get(hash))
            .ok_or(ProposeError::NoParents)?;
        let bonds = main_parent.bonds.clone();
        let parent_states = parent_hashes
            .iter()
            .map(|hash| {
                dag.get(hash)
                    .map(|parent| parent.post_state_hash)
                    .ok_or(ProposeError::UnknownParent(*hash))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (seq_num, previous) = self.next_in_sequence(dag);
        let mut justifications: BTreeMap<ValidatorId, BlockHash> = dag
            .latest_messages()
            .map(|(validator, latest)| (validator, *latest.canonical()))
            .collect();
        justifications.insert(self.validator, previous);

        let pre_state_hash = self.engine.merge_states(&parent_states).await?;
        let post_state_hash = self.engine.execute(pre_state_hash, &deploys).await?;

        let mut block = Block {
            hash: [0u8; 32],
            sender: self.validator,
            seq_num,
            parent_hashes,
            justifications,
            timestamp: now,
            pre_state_hash,
            post_state_hash,
            deploys,
            bonds,
            signature: Vec::new(),
        };
        block.hash = self.crypto.hash(&block.content_bytes());
        block.signature = self.keypair.sign(&block.hash).to_vec();

        debug!(
            block = %short_hex(&block.hash),
            seq_num,
            parents = block.parent_hashes.len(),
            deploys = block.deploys.len(),
            "Block proposed"
        );
        casper_telemetry::BLOCKS_PROPOSED.inc();
        Ok(block)
    }

    /// Sequence number and creator justification for the next block.
    ///
    /// After an equivocation the newest competing tip wins, smallest hash
    /// breaking ties.
    fn next_in_sequence(&self, dag: &BlockDag) -> (u64, BlockHash) {
        let newest = dag.latest_message(&self.validator).and_then(|latest| {
            latest
                .hashes()
                .iter()
                .filter_map(|hash| dag.get(hash).map(|block| (block.seq_num, *hash)))
                .min_by_key(|(seq_num, hash)| (std::cmp::Reverse(*seq_num), *hash))
        });
        match newest {
            Some((seq_num, hash)) => (seq_num + 1, hash),
            None => (0, *dag.genesis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_01_block_dag::DagStore;
    use cc_02_fork_choice::Estimator;
    use cc_03_validation::test_utils::{deploy, BlockFactory};
    use cc_03_validation::{
        BlockAdmission, HashChainExecutionEngine, Secp256k1Blake3Provider,
        ValidationConfig, ValidationDependencies, ValidationPipeline,
    };

    struct Harness {
        factory: BlockFactory,
        store: DagStore,
        proposer: BlockProposer<Secp256k1Blake3Provider, HashChainExecutionEngine>,
        pipeline: ValidationPipeline<Secp256k1Blake3Provider, HashChainExecutionEngine>,
    }

    impl Harness {
        fn new() -> Self {
            let factory = BlockFactory::new(&[60, 40]);
            let store = factory.store();
            // Same seed as the factory's first validator.
            let keypair = Secp256k1KeyPair::from_bytes([1u8; 32]).unwrap();
            let proposer = BlockProposer::new(
                keypair,
                Arc::new(Secp256k1Blake3Provider),
                Arc::new(HashChainExecutionEngine),
                Arc::new(Estimator::default()),
            );
            let pipeline = ValidationPipeline::new(ValidationDependencies {
                crypto: Arc::new(Secp256k1Blake3Provider),
                engine: Arc::new(HashChainExecutionEngine),
                config: ValidationConfig::default(),
            });
            Self {
                factory,
                store,
                proposer,
                pipeline,
            }
        }

        async fn propose_and_admit(&self, deploys: Vec<Deploy>) -> Block {
            let block = self
                .proposer
                .propose(&self.store.snapshot(), deploys, self.factory.now())
                .await
                .unwrap();
            let outcome = self.pipeline.admit(block.clone(), &self.store).await;
            assert!(outcome.is_admitted(), "{outcome:?}");
            block
        }
    }

    #[tokio::test]
    async fn test_first_block_builds_on_genesis() {
        let h = Harness::new();
        assert_eq!(h.proposer.validator(), h.factory.validator(0));

        let block = h.propose_and_admit(Vec::new()).await;
        let genesis = *h.store.snapshot().genesis();

        assert_eq!(block.seq_num, 0);
        assert_eq!(block.parent_hashes, vec![genesis]);
        assert_eq!(block.creator_justification(), Some(&genesis));
        assert_eq!(block.bonds, h.factory.genesis().bonds);
    }

    #[tokio::test]
    async fn test_sequence_advances_and_justifies_peers() {
        let mut h = Harness::new();
        let first = h.propose_and_admit(Vec::new()).await;

        let peer = h.factory.build(&h.store.snapshot(), 1, &[first.hash], Vec::new());
        assert!(h.pipeline.admit(peer.clone(), &h.store).await.is_admitted());

        let second = h.propose_and_admit(Vec::new()).await;
        assert_eq!(second.seq_num, 1);
        assert_eq!(second.creator_justification(), Some(&first.hash));
        assert_eq!(second.justifications.get(&peer.sender), Some(&peer.hash));
    }

    #[tokio::test]
    async fn test_deploys_are_executed() {
        let h = Harness::new();
        let deploys = vec![deploy(b"transfer"), deploy(b"bond")];
        let block = h.propose_and_admit(deploys.clone()).await;

        let expected = HashChainExecutionEngine::apply(block.pre_state_hash, &deploys).unwrap();
        assert_eq!(block.post_state_hash, expected);
        assert_eq!(block.deploys, deploys);
    }

    #[tokio::test]
    async fn test_invalid_deploy_fails_proposal() {
        let h = Harness::new();
        let mut bad = deploy(b"transfer");
        bad.payload = b"tampered".to_vec();

        let err = h
            .proposer
            .propose(&h.store.snapshot(), vec![bad.clone()], h.factory.now())
            .await
            .unwrap_err();
        assert_eq!(err, ProposeError::Execution(ExecutionError::InvalidDeploy(bad.hash)));
    }
}
