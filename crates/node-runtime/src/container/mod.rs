//! # Node Container
//!
//! Builds every subsystem from a [`NodeConfig`] and holds the shared
//! handles. Construction order follows the data flow:
//!
//! 1. Genesis block and DAG store
//! 2. Fork-choice estimator
//! 3. Validation pipeline (uses the estimator for its advisory)
//! 4. Deploy pool and finality service
//! 5. Block proposer, when a signing key is configured

pub mod config;

pub use config::{ConfigError, NodeConfig, ProposerConfig};

use std::sync::Arc;

use cc_01_block_dag::{BlockDag, DagError, DagStore};
use cc_02_fork_choice::Estimator;
use cc_03_validation::{
    HashChainExecutionEngine, Secp256k1Blake3Provider, ValidationDependencies, ValidationPipeline,
};
use cc_04_finality::{
    FinalityDependencies, FinalityService, InMemoryDeployPool, NoopPruner, TracingStateNotifier,
};
use shared_crypto::{CryptoError, Secp256k1KeyPair};
use shared_types::short_hex;
use thiserror::Error;
use tracing::{info, warn};

use crate::genesis::{GenesisBuilder, GenesisError};
use crate::proposer::BlockProposer;

pub type Pipeline = ValidationPipeline<Secp256k1Blake3Provider, HashChainExecutionEngine>;
pub type Finality = FinalityService<InMemoryDeployPool, TracingStateNotifier, NoopPruner>;
pub type Proposer = BlockProposer<Secp256k1Blake3Provider, HashChainExecutionEngine>;

/// Failures while assembling the node.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),

    #[error(transparent)]
    Dag(#[from] DagError),

    #[error("Invalid validator key: {0}")]
    SigningKey(#[from] CryptoError),
}

/// Every subsystem of a running node.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub store: Arc<DagStore>,
    pub estimator: Arc<Estimator>,
    pub pipeline: Arc<Pipeline>,
    pub deploy_pool: Arc<InMemoryDeployPool>,
    pub finality: Arc<Finality>,
    pub proposer: Option<Arc<Proposer>>,
}

impl NodeContainer {
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        config.validate()?;

        let genesis = GenesisBuilder::new(config.genesis.clone()).build()?;
        info!(
            genesis = %short_hex(&genesis.hash),
            validators = genesis.bonds.len(),
            chain = %config.genesis.chain_name,
            "Genesis block built"
        );
        let store = Arc::new(DagStore::new(BlockDag::new(genesis, config.dag.clone())?));

        let estimator = Arc::new(Estimator::new(config.fork_choice.clone()));
        let crypto = Arc::new(Secp256k1Blake3Provider);
        let engine = Arc::new(HashChainExecutionEngine);

        let pipeline = Arc::new(
            ValidationPipeline::new(ValidationDependencies {
                crypto: Arc::clone(&crypto),
                engine: Arc::clone(&engine),
                config: config.validation.clone(),
            })
            .with_parent_selector(estimator.clone()),
        );

        if config.finality.keep_depth.is_some() {
            warn!("CC_KEEP_DEPTH set, but the in-memory DAG keeps all history");
        }
        let deploy_pool = Arc::new(InMemoryDeployPool::new());
        let finality = Arc::new(FinalityService::new(FinalityDependencies {
            store: Arc::clone(&store),
            deploy_pool: Arc::clone(&deploy_pool),
            notifier: Arc::new(TracingStateNotifier),
            pruner: Arc::new(NoopPruner),
            config: config.finality.clone(),
        }));

        let proposer = match config.proposer.signing_key {
            Some(key) => {
                let keypair = Secp256k1KeyPair::from_bytes(key)?;
                let proposer = BlockProposer::new(keypair, crypto, engine, estimator.clone());
                let bonded = store.snapshot().weights().is_bonded(&proposer.validator());
                info!(validator = %proposer.validator(), bonded, "Block proposer enabled");
                Some(Arc::new(proposer))
            }
            None => None,
        };

        Ok(Self {
            config,
            store,
            estimator,
            pipeline,
            deploy_pool,
            finality,
            proposer,
        })
    }
}
