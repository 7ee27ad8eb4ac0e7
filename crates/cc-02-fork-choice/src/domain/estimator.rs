//! # Fork Choice Estimator
//!
//! Chooses the parents of a new block from the current latest messages.
//!
//! ## Algorithm
//!
//! 1. No latest messages: build on genesis.
//! 2. Find the latest common ancestor (LCA) of every voting tip.
//! 3. Score every block between the LCA and the tips by supporting weight.
//! 4. Keep the frontier of the scored sub-DAG (scored blocks without a scored
//!    child), rank it by `(-score, hash)` and take the first `max_parents`.
//! 5. Drop any candidate that is a strict ancestor of another candidate.
//!
//! The first parent returned is the main parent: the heaviest tip.

use cc_01_block_dag::{BlockDag, DEFAULT_MAX_TRAVERSAL_DEPTH};
use shared_types::{short_hex, BlockHash};
use tracing::debug;

use super::lca::{latest_common_ancestor, voting_tips};
use super::scoring::{score_map, ScoreMap};

/// Default upper bound on parents per block.
pub const DEFAULT_MAX_PARENTS: usize = 5;

/// Estimator tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkChoiceConfig {
    /// Maximum parents per block.
    pub max_parents: usize,
    /// Parent-edge hop cap for LCA and scoring walks.
    pub max_traversal_depth: usize,
}

impl Default for ForkChoiceConfig {
    fn default() -> Self {
        Self {
            max_parents: DEFAULT_MAX_PARENTS,
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
        }
    }
}

/// Full estimator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    /// Selected parents, main parent first.
    pub parents: Vec<BlockHash>,
    /// Latest common ancestor the scores are anchored at.
    pub lca: BlockHash,
    /// Score of every block reached from the tips.
    pub scores: ScoreMap,
}

/// Fork-choice estimator over a DAG snapshot. Pure: same DAG, same answer.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    config: ForkChoiceConfig,
}

impl Estimator {
    pub fn new(config: ForkChoiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForkChoiceConfig {
        &self.config
    }

    pub fn latest_common_ancestor(&self, dag: &BlockDag) -> BlockHash {
        latest_common_ancestor(dag, self.config.max_traversal_depth)
    }

    pub fn score_map(&self, dag: &BlockDag, lca: &BlockHash) -> ScoreMap {
        score_map(dag, lca, self.config.max_traversal_depth)
    }

    /// Run the full estimation.
    pub fn estimate(&self, dag: &BlockDag) -> Estimate {
        let genesis = *dag.genesis();
        if voting_tips(dag).is_empty() {
            return Estimate {
                parents: vec![genesis],
                lca: genesis,
                scores: ScoreMap::new(),
            };
        }

        let lca = self.latest_common_ancestor(dag);
        let scores = self.score_map(dag, &lca);
        let ranked = rank_frontier(dag, &scores);

        let top: Vec<BlockHash> = ranked
            .iter()
            .take(self.config.max_parents.max(1))
            .map(|(hash, _)| *hash)
            .collect();
        let mut parents: Vec<BlockHash> = top
            .iter()
            .filter(|candidate| !top.iter().any(|other| dag.is_strict_ancestor(candidate, other)))
            .copied()
            .collect();
        if parents.is_empty() {
            parents.push(lca);
        }

        debug!(
            lca = %short_hex(&lca),
            scored = scores.len(),
            frontier = ranked.len(),
            parents = parents.len(),
            main_parent = %short_hex(&parents[0]),
            "Fork choice estimated"
        );

        Estimate {
            parents,
            lca,
            scores,
        }
    }

    /// Parents for a new block, main parent first.
    pub fn select_parents(&self, dag: &BlockDag) -> Vec<BlockHash> {
        self.estimate(dag).parents
    }
}

/// Parents for a new block using the default traversal depth.
pub fn select_parents(dag: &BlockDag, max_parents: usize) -> Vec<BlockHash> {
    Estimator::new(ForkChoiceConfig {
        max_parents,
        ..ForkChoiceConfig::default()
    })
    .select_parents(dag)
}

/// Scored blocks with no scored child, ordered by descending score then
/// ascending hash.
fn rank_frontier(dag: &BlockDag, scores: &ScoreMap) -> Vec<(BlockHash, u128)> {
    let mut frontier: Vec<(BlockHash, u128)> = scores
        .iter()
        .filter(|(hash, _)| {
            !dag.children(hash)
                .iter()
                .any(|child| scores.contains_key(child))
        })
        .map(|(hash, score)| (*hash, *score))
        .collect();
    frontier.sort_by(|(ha, sa), (hb, sb)| sb.cmp(sa).then_with(|| ha.cmp(hb)));
    frontier
}
