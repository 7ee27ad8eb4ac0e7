//! Harness that builds signed blocks and admits them through the real
//! validation pipeline.

use std::sync::Arc;

use cc_01_block_dag::DagStore;
use cc_03_validation::test_utils::BlockFactory;
use cc_03_validation::{
    AdmissionOutcome, BlockAdmission, HashChainExecutionEngine, Secp256k1Blake3Provider,
    ValidationConfig, ValidationDependencies, ValidationPipeline,
};
use cc_04_finality::{
    FinalityConfig, FinalityDependencies, FinalityService, InMemoryDeployPool, NoopPruner,
    TracingStateNotifier,
};
use shared_types::{Block, BlockHash, Deploy};

pub type Pipeline = ValidationPipeline<Secp256k1Blake3Provider, HashChainExecutionEngine>;
pub type Finality = FinalityService<InMemoryDeployPool, TracingStateNotifier, NoopPruner>;

pub fn pipeline() -> Pipeline {
    ValidationPipeline::new(ValidationDependencies {
        crypto: Arc::new(Secp256k1Blake3Provider),
        engine: Arc::new(HashChainExecutionEngine),
        config: ValidationConfig::default(),
    })
}

/// Validators with fixed stakes sharing one DAG.
pub struct Network {
    pub factory: BlockFactory,
    pub store: Arc<DagStore>,
    pub pipeline: Pipeline,
}

impl Network {
    pub fn new(stakes: &[u64]) -> Self {
        let factory = BlockFactory::new(stakes);
        let store = Arc::new(factory.store());
        Self {
            factory,
            store,
            pipeline: pipeline(),
        }
    }

    pub fn genesis(&self) -> BlockHash {
        *self.store.snapshot().genesis()
    }

    /// Next block of `creator` on `parents`, not yet admitted.
    pub fn build(&mut self, creator: usize, parents: &[BlockHash], deploys: Vec<Deploy>) -> Block {
        let dag = self.store.snapshot();
        self.factory.build(&dag, creator, parents, deploys)
    }

    pub async fn admit(&self, block: Block) -> AdmissionOutcome {
        self.pipeline.admit(block, &self.store).await
    }

    /// Build and admit; panics if the block is not admitted.
    pub async fn extend(&mut self, creator: usize, parents: &[BlockHash]) -> BlockHash {
        let block = self.build(creator, parents, Vec::new());
        let hash = block.hash;
        let outcome = self.admit(block).await;
        assert!(outcome.is_admitted(), "block not admitted: {outcome:?}");
        hash
    }

    /// Finality service over this network's store.
    pub fn finality(&self) -> Finality {
        FinalityService::new(FinalityDependencies {
            store: Arc::clone(&self.store),
            deploy_pool: Arc::new(InMemoryDeployPool::new()),
            notifier: Arc::new(TracingStateNotifier),
            pruner: Arc::new(NoopPruner),
            config: FinalityConfig::default(),
        })
    }
}
