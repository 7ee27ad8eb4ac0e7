//! Validation Pipeline - admission of candidate blocks
//!
//! # Stages
//! 1. Format: structural limits, duplicate admission, timestamp drift
//! 2. Crypto: content hash and signature
//! 3. Consensus: sequence numbers, creator justification, justification
//!    senders, fork-choice cross-check (advisory)
//! 4. Dependencies: every parent and justification target is in the DAG
//! 5. State transition: merged pre-state and executed post-state
//! 6. Byzantine: neglected equivocations and equivocation classification
//!
//! Stages 1 to 4 read a single DAG snapshot and never await, so a malformed
//! or forged block is refused before the execution engine sees it. Stage 6
//! and the insert run together inside [`DagStore::update`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cc_01_block_dag::{BlockDag, DagError, DagStore, EquivocationEvidence};
use cc_02_fork_choice::{Estimator, ForkChoiceConfig, ParentSelector};
use shared_types::{short_hex, Block, BlockHash, StateHash};
use tracing::{debug, info, warn};

use crate::domain::{
    check_crypto, check_equivocations, check_format, check_justification_senders,
    check_parents, check_sequence, AdmissionOutcome, AdmittedBlock, ByzantineViolation,
    ConsensusViolation, EquivocationClass, FormatViolation, Halt, PreValidated, StateTransitionViolation,
    ValidationConfig,
};
use crate::ports::{BlockAdmission, CryptoProvider, ExecutionEngine, SystemTimeSource, TimeSource};

/// Dependencies for ValidationPipeline
pub struct ValidationDependencies<C, X> {
    pub crypto: Arc<C>,
    pub engine: Arc<X>,
    pub config: ValidationConfig,
}

/// The six-stage admission pipeline.
///
/// Holds no block buffer: a `Pending` candidate must be resubmitted by the
/// caller once its dependencies are admitted.
pub struct ValidationPipeline<C, X>
where
    C: CryptoProvider,
    X: ExecutionEngine,
{
    crypto: Arc<C>,
    engine: Arc<X>,
    config: ValidationConfig,
    time_source: Box<dyn TimeSource>,
    parent_selector: Arc<dyn ParentSelector>,
}

impl<C, X> ValidationPipeline<C, X>
where
    C: CryptoProvider,
    X: ExecutionEngine,
{
    pub fn new(deps: ValidationDependencies<C, X>) -> Self {
        let estimator = Estimator::new(ForkChoiceConfig {
            max_parents: deps.config.max_parents,
            max_traversal_depth: deps.config.max_traversal_depth,
        });
        Self {
            crypto: deps.crypto,
            engine: deps.engine,
            config: deps.config,
            time_source: Box::new(SystemTimeSource),
            parent_selector: Arc::new(estimator),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Replace the fork choice used for the parent cross-check.
    pub fn with_parent_selector(mut self, selector: Arc<dyn ParentSelector>) -> Self {
        self.parent_selector = selector;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Stages 1 to 4 against one snapshot.
    pub fn pre_validate(&self, block: &Block, dag: &BlockDag) -> Result<PreValidated, Halt> {
        if dag.contains(&block.hash) {
            return Err(Halt::reject(ConsensusViolation::AlreadyAdmitted(block.hash)));
        }
        check_format(block, &self.config, self.time_source.now_millis()).map_err(Halt::reject)?;
        check_crypto(block, self.crypto.as_ref()).map_err(Halt::reject)?;
        let same_sequence = check_sequence(block, dag).map_err(Halt::reject)?;
        check_justification_senders(block, dag).map_err(Halt::reject)?;

        let missing = dag.missing_dependencies(block);
        if !missing.is_empty() {
            return Err(Halt::Pending(missing.into_iter().collect()));
        }

        let mut advisories = Vec::new();
        if self.config.check_fork_choice {
            let expected = self.parent_selector.select_parents(dag);
            if let Some(advisory) = check_parents(block, &expected) {
                debug!(block = %short_hex(&block.hash), "Declared parents diverge from fork choice");
                advisories.push(advisory);
            }
        }
        Ok(PreValidated {
            same_sequence,
            advisories,
        })
    }

    /// Stage 5: replay the parents' states and the block's deploys.
    async fn check_state_transition(
        &self,
        block: &Block,
        dag: &BlockDag,
    ) -> Result<(), StateTransitionViolation> {
        let parent_states: Vec<StateHash> = block
            .parent_hashes
            .iter()
            .filter_map(|parent| dag.get(parent).map(|b| b.post_state_hash))
            .collect();

        let expected_pre = self
            .engine
            .merge_states(&parent_states)
            .await
            .map_err(|e| StateTransitionViolation::ExecutionFailed(e.to_string()))?;
        if expected_pre != block.pre_state_hash {
            return Err(StateTransitionViolation::InvalidPreStateHash);
        }

        let post_state = self
            .engine
            .execute(expected_pre, &block.deploys)
            .await
            .map_err(|e| StateTransitionViolation::ExecutionFailed(e.to_string()))?;
        if post_state != block.post_state_hash {
            return Err(StateTransitionViolation::InvalidPostStateHash);
        }
        Ok(())
    }

    async fn run(&self, block: Block, store: &DagStore) -> AdmissionOutcome {
        let snapshot = store.snapshot();

        let pre = match self.pre_validate(&block, &snapshot) {
            Ok(pre) => pre,
            Err(halt) => return halt.into(),
        };

        if let Err(violation) = self.check_state_transition(&block, &snapshot).await {
            return AdmissionOutcome::Rejected(violation.into());
        }

        // Stage 6 runs under the writer lock against the DAG the block is
        // inserted into, so an equivocation admitted since `snapshot` is seen.
        let hash = block.hash;
        let max_depth = self.config.max_traversal_depth;
        let staged = store.update(move |dag| {
            let same_sequence = dag.blocks_at(&block.sender, block.seq_num);
            let direct = direct_evidence(&block, &same_sequence);
            let equivocations = check_equivocations(&block, dag, direct.as_ref(), max_depth)
                .map_err(Refusal::Byzantine)?;
            let inserted = dag.insert(block).map_err(Refusal::Dag)?;
            Ok::<_, Refusal>((inserted, equivocations))
        });

        match staged {
            Ok((inserted, equivocations)) => AdmissionOutcome::Admitted(AdmittedBlock {
                hash,
                height: inserted.height,
                direct_equivocation: inserted.equivocation,
                equivocations,
                advisories: pre.advisories,
            }),
            Err(Refusal::Byzantine(violation)) => AdmissionOutcome::Rejected(violation.into()),
            Err(Refusal::Dag(DagError::AlreadyExists { hash })) => {
                AdmissionOutcome::Rejected(ConsensusViolation::AlreadyAdmitted(hash).into())
            }
            Err(Refusal::Dag(DagError::MissingDependencies { missing, .. })) => {
                AdmissionOutcome::Pending(missing.into_iter().collect())
            }
            Err(Refusal::Dag(DagError::InvalidGenesis(_))) => {
                AdmissionOutcome::Rejected(FormatViolation::NoParents.into())
            }
            Err(Refusal::Dag(other)) => AdmissionOutcome::Rejected(
                ConsensusViolation::DagRefused(other.to_string()).into(),
            ),
        }
    }

    fn record(&self, hash: &[u8], outcome: &AdmissionOutcome, started: Instant) {
        crate::metrics::record_validation_latency(started.elapsed().as_secs_f64());
        match outcome {
            AdmissionOutcome::Admitted(admitted) => {
                crate::metrics::record_block_admitted();
                for classified in &admitted.equivocations {
                    crate::metrics::record_equivocation(match classified.class {
                        EquivocationClass::Admissible => "admissible",
                        EquivocationClass::Ignorable => "ignorable",
                    });
                }
                if let Some(evidence) = &admitted.direct_equivocation {
                    warn!(
                        block = %short_hex(hash),
                        validator = %evidence.validator,
                        seq_num = evidence.seq_num,
                        "Admitted equivocating block"
                    );
                } else {
                    info!(block = %short_hex(hash), height = admitted.height, "Block admitted");
                }
            }
            AdmissionOutcome::Pending(missing) => {
                crate::metrics::record_block_pending();
                debug!(block = %short_hex(hash), missing = missing.len(), "Block pending on dependencies");
            }
            AdmissionOutcome::Rejected(reason) => {
                crate::metrics::record_block_rejected(reason.category().as_str());
                if reason.is_reputation_relevant() {
                    warn!(block = %short_hex(hash), %reason, "Block rejected");
                } else {
                    debug!(block = %short_hex(hash), %reason, "Block rejected");
                }
            }
        }
    }
}

/// Why the final write refused the block.
enum Refusal {
    Byzantine(ByzantineViolation),
    Dag(DagError),
}

/// Evidence when `block` shares its `(sender, seq_num)` with stored blocks.
fn direct_evidence(block: &Block, same_sequence: &[BlockHash]) -> Option<EquivocationEvidence> {
    if same_sequence.iter().all(|hash| *hash == block.hash) {
        return None;
    }
    let competing: BTreeSet<BlockHash> = same_sequence
        .iter()
        .copied()
        .chain(std::iter::once(block.hash))
        .collect();
    Some(EquivocationEvidence {
        validator: block.sender,
        seq_num: block.seq_num,
        competing: competing.into_iter().collect(),
    })
}

#[async_trait]
impl<C, X> BlockAdmission for ValidationPipeline<C, X>
where
    C: CryptoProvider + 'static,
    X: ExecutionEngine + 'static,
{
    async fn admit(&self, block: Block, store: &DagStore) -> AdmissionOutcome {
        let started = Instant::now();
        let hash = block.hash;
        let outcome = self.run(block, store).await;
        self.record(&hash, &outcome, started);
        outcome
    }
}
