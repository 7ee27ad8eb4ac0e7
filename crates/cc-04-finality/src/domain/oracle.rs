//! # Safety Oracle
//!
//! Estimates how safe a block is from being orphaned by finding the heaviest
//! group of validators that both build on it and have seen each other build
//! on it.
//!
//! ## Algorithm
//!
//! 1. Supporters: bonded validators whose latest message is the target or a
//!    descendant of it. An equivocator supports only if every competing
//!    latest message does.
//! 2. Agreement graph: `v1` and `v2` are adjacent when each one's latest
//!    block justifies a block of the other that descends from the target.
//! 3. Heaviest clique: exact up to `exact_clique_max_validators`
//!    supporters, greedy beyond.
//! 4. Fault tolerance: `(2 × clique weight − total weight) / total weight`.

use std::collections::BTreeSet;

use cc_01_block_dag::BlockDag;
use shared_types::{short_hex, BlockHash, ValidatorId};
use tracing::{debug, trace};

use super::cancel::{ScanCancel, ScanCancelled};
use super::clique::{greedy_clique, max_weighted_clique_cancellable, CliqueMethod};
use super::fault_tolerance::FaultTolerance;

/// Supporter count above which the greedy clique is used.
pub const DEFAULT_EXACT_CLIQUE_MAX_VALIDATORS: usize = 64;

/// Full oracle result for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyReport {
    pub target: BlockHash,
    /// Supporting validators, ascending.
    pub supporters: Vec<ValidatorId>,
    /// Members of the heaviest agreeing clique, ascending.
    pub clique: Vec<ValidatorId>,
    pub clique_weight: u128,
    pub total_weight: u128,
    pub method: CliqueMethod,
    pub fault_tolerance: FaultTolerance,
}

/// Clique-based safety oracle. Pure: reads a DAG snapshot, never mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyOracle {
    exact_clique_max_validators: usize,
}

impl Default for SafetyOracle {
    fn default() -> Self {
        Self::new(DEFAULT_EXACT_CLIQUE_MAX_VALIDATORS)
    }
}

impl SafetyOracle {
    pub fn new(exact_clique_max_validators: usize) -> Self {
        Self {
            exact_clique_max_validators,
        }
    }

    pub fn exact_clique_max_validators(&self) -> usize {
        self.exact_clique_max_validators
    }

    /// Run every step for `target` and keep the intermediate results.
    pub fn analyze(&self, target: &BlockHash, dag: &BlockDag) -> SafetyReport {
        self.report(target, dag, &ScanCancel::new())
    }

    /// [`SafetyOracle::analyze`] that gives up once `cancel` is set.
    pub fn analyze_cancellable(
        &self,
        target: &BlockHash,
        dag: &BlockDag,
        cancel: &ScanCancel,
    ) -> Result<SafetyReport, ScanCancelled> {
        let report = self.report(target, dag, cancel);
        cancel.check()?;
        Ok(report)
    }

    // A cancelled run drops edges and clique members, so its fault
    // tolerance is never above the true value.
    fn report(&self, target: &BlockHash, dag: &BlockDag, cancel: &ScanCancel) -> SafetyReport {
        let weights = dag.weights();
        let total_weight = weights.total();
        let supporters = supporters(target, dag);

        let vertex_weights: Vec<u128> = supporters
            .iter()
            .map(|v| weights.weight_of(v) as u128)
            .collect();
        let adjacency = agreement_graph(target, &supporters, dag, cancel);

        let method = if supporters.len() <= self.exact_clique_max_validators {
            CliqueMethod::Exact
        } else {
            CliqueMethod::Approximate
        };
        let clique = match method {
            CliqueMethod::Exact => {
                max_weighted_clique_cancellable(&vertex_weights, &adjacency, cancel)
                    .unwrap_or_default()
            }
            CliqueMethod::Approximate => greedy_clique(&vertex_weights, &adjacency),
        };

        let fault_tolerance = FaultTolerance::from_weights(clique.weight, total_weight);
        trace!(
            target = %short_hex(target),
            supporters = supporters.len(),
            clique = clique.members.len(),
            clique_weight = %clique.weight,
            total_weight = %total_weight,
            method = method.as_str(),
            fault_tolerance = %fault_tolerance,
            "Safety oracle evaluated"
        );

        SafetyReport {
            target: *target,
            clique: clique.members.iter().map(|i| supporters[*i]).collect(),
            supporters,
            clique_weight: clique.weight,
            total_weight,
            method,
            fault_tolerance,
        }
    }

    pub fn fault_tolerance(&self, target: &BlockHash, dag: &BlockDag) -> FaultTolerance {
        self.analyze(target, dag).fault_tolerance
    }

    /// First block above `last_finalized`, by `(height, hash)`, whose fault
    /// tolerance exceeds `threshold`.
    ///
    /// Only non-finalized descendants of `last_finalized` are candidates.
    pub fn finalize(
        &self,
        dag: &BlockDag,
        last_finalized: &BlockHash,
        threshold: FaultTolerance,
    ) -> Option<BlockHash> {
        self.scan(dag, last_finalized, threshold, &ScanCancel::new())
    }

    /// [`SafetyOracle::finalize`] that checks `cancel` between candidates
    /// and inside the clique search.
    pub fn finalize_cancellable(
        &self,
        dag: &BlockDag,
        last_finalized: &BlockHash,
        threshold: FaultTolerance,
        cancel: &ScanCancel,
    ) -> Result<Option<BlockHash>, ScanCancelled> {
        let found = self.scan(dag, last_finalized, threshold, cancel);
        cancel.check()?;
        Ok(found)
    }

    fn scan(
        &self,
        dag: &BlockDag,
        last_finalized: &BlockHash,
        threshold: FaultTolerance,
        cancel: &ScanCancel,
    ) -> Option<BlockHash> {
        let floor = dag.height(last_finalized)?;
        for (height, candidate) in dag.blocks_above(floor) {
            if cancel.is_cancelled() {
                return None;
            }
            if dag.is_finalized(&candidate) || !dag.descends_from(&candidate, last_finalized) {
                continue;
            }
            let report = self.report(&candidate, dag, cancel);
            if report.fault_tolerance > threshold && !cancel.is_cancelled() {
                debug!(
                    block = %short_hex(&candidate),
                    height,
                    fault_tolerance = %report.fault_tolerance,
                    clique = report.clique.len(),
                    "Finalization candidate found"
                );
                return Some(candidate);
            }
        }
        None
    }
}

/// Bonded validators whose every latest message is `target` or descends
/// from it, ascending.
pub fn supporters(target: &BlockHash, dag: &BlockDag) -> Vec<ValidatorId> {
    let weights = dag.weights();
    dag.latest_messages()
        .filter(|(validator, _)| weights.is_bonded(validator))
        .filter(|(_, latest)| {
            latest
                .hashes()
                .iter()
                .all(|tip| dag.descends_from(tip, target))
        })
        .map(|(validator, _)| validator)
        .collect()
}

/// Adjacency lists over `supporters` (by index).
fn agreement_graph(
    target: &BlockHash,
    supporters: &[ValidatorId],
    dag: &BlockDag,
    cancel: &ScanCancel,
) -> Vec<BTreeSet<usize>> {
    let n = supporters.len();
    let mut adjacency = vec![BTreeSet::new(); n];
    for i in 0..n {
        if cancel.is_cancelled() {
            break;
        }
        for j in (i + 1)..n {
            if sees_committed(&supporters[i], &supporters[j], target, dag)
                && sees_committed(&supporters[j], &supporters[i], target, dag)
            {
                adjacency[i].insert(j);
                adjacency[j].insert(i);
            }
        }
    }
    adjacency
}

/// Every latest block of `observer` justifies a block of `subject` at or
/// above `target`.
fn sees_committed(
    observer: &ValidatorId,
    subject: &ValidatorId,
    target: &BlockHash,
    dag: &BlockDag,
) -> bool {
    let Some(latest) = dag.latest_message(observer) else {
        return false;
    };
    latest.hashes().iter().all(|tip| {
        dag.get(tip)
            .and_then(|block| block.justifications.get(subject))
            .is_some_and(|justified| dag.descends_from(justified, target))
    })
}

/// [`SafetyOracle::fault_tolerance`] with default settings.
pub fn fault_tolerance(target: &BlockHash, dag: &BlockDag) -> FaultTolerance {
    SafetyOracle::default().fault_tolerance(target, dag)
}

/// [`SafetyOracle::finalize`] with default settings.
pub fn finalize(
    dag: &BlockDag,
    last_finalized: &BlockHash,
    threshold: FaultTolerance,
) -> Option<BlockHash> {
    SafetyOracle::default().finalize(dag, last_finalized, threshold)
}
