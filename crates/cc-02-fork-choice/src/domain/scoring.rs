//! # Score Map
//!
//! Stake-weighted support for every block between the LCA and the tips.

use std::collections::{BTreeMap, HashSet, VecDeque};

use cc_01_block_dag::BlockDag;
use shared_types::{short_hex, BlockHash};
use tracing::warn;

use super::lca::voting_tips;

/// Block hash to accumulated weight.
pub type ScoreMap = BTreeMap<BlockHash, u128>;

/// Add each voting validator's weight to every block its latest message
/// reaches without dropping below the LCA's height.
///
/// An equivocator's weight is added once per competing tip, so a block on
/// both of its chains counts it twice.
pub fn score_map(dag: &BlockDag, lca: &BlockHash, max_depth: usize) -> ScoreMap {
    let floor = dag.height(lca).unwrap_or(0);
    let weights = dag.weights();
    let mut scores = ScoreMap::new();

    for (validator, tips) in voting_tips(dag) {
        let weight = weights.weight_of(&validator) as u128;
        for tip in &tips {
            for block in walk_to_floor(dag, tip, floor, max_depth) {
                *scores.entry(block).or_insert(0) += weight;
            }
        }
    }
    scores
}

fn walk_to_floor(
    dag: &BlockDag,
    tip: &BlockHash,
    floor: u64,
    max_depth: usize,
) -> HashSet<BlockHash> {
    let mut visited = HashSet::new();
    if dag.height(tip).map_or(true, |h| h < floor) {
        return visited;
    }
    visited.insert(*tip);

    let mut truncated = false;
    let mut queue = VecDeque::from([(*tip, 0usize)]);
    while let Some((current, depth)) = queue.pop_front() {
        for parent in dag.parents(&current) {
            if visited.contains(parent) || dag.height(parent).map_or(true, |h| h < floor) {
                continue;
            }
            if depth >= max_depth {
                truncated = true;
                continue;
            }
            visited.insert(*parent);
            queue.push_back((*parent, depth + 1));
        }
    }

    if truncated {
        warn!(
            tip = %short_hex(tip),
            floor,
            max_depth,
            "Score walk truncated at depth cap"
        );
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::latest_common_ancestor;
    use cc_01_block_dag::test_utils::{validator, DagBuilder};
    use cc_01_block_dag::DEFAULT_MAX_TRAVERSAL_DEPTH;

    const DEPTH: usize = DEFAULT_MAX_TRAVERSAL_DEPTH;

    #[test]
    fn test_weights_accumulate_down_to_lca() {
        let mut builder = DagBuilder::new(&[(validator(1), 10), (validator(2), 20)]);
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let b1 = builder.block(validator(2), &[g]);

        let scores = score_map(builder.dag(), &g, DEPTH);

        assert_eq!(scores.get(&a1), Some(&10));
        assert_eq!(scores.get(&b1), Some(&20));
        assert_eq!(scores.get(&g), Some(&30));
    }

    #[test]
    fn test_blocks_below_lca_unscored() {
        let mut builder = DagBuilder::new(&[(validator(1), 10), (validator(2), 20)]);
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let a2 = builder.block(validator(1), &[a1]);
        let b1 = builder.block(validator(2), &[a1]);

        let lca = latest_common_ancestor(builder.dag(), DEPTH);
        let scores = score_map(builder.dag(), &lca, DEPTH);

        assert_eq!(lca, a1);
        assert!(!scores.contains_key(&g));
        assert_eq!(scores.get(&a1), Some(&30));
        assert_eq!(scores.get(&a2), Some(&10));
        assert_eq!(scores.get(&b1), Some(&20));
    }

    #[test]
    fn test_equivocator_counted_on_each_chain() {
        let mut builder = DagBuilder::new(&[(validator(1), 10), (validator(2), 20)]);
        let g = builder.genesis();
        let x = builder.block(validator(1), &[g]);
        let y = builder.equivocate(validator(1), 0, &[g], &[]);

        let scores = score_map(builder.dag(), &g, DEPTH);

        assert_eq!(scores.get(&x), Some(&10));
        assert_eq!(scores.get(&y), Some(&10));
        assert_eq!(scores.get(&g), Some(&20));
    }

    #[test]
    fn test_score_grows_when_chain_extended() {
        let mut builder = DagBuilder::new(&[(validator(1), 10), (validator(2), 20)]);
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        builder.block(validator(2), &[g]);
        let before = score_map(builder.dag(), &g, DEPTH);

        let b2 = builder.block(validator(2), &[a1]);
        let after = score_map(builder.dag(), &g, DEPTH);

        assert!(after[&a1] > before[&a1]);
        assert_eq!(after[&b2], 20);
        assert_eq!(after[&g], before[&g]);
    }
}
