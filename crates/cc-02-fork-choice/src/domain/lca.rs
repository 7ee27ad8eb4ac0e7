//! # Latest Common Ancestor
//!
//! The deepest block every bonded validator's latest message builds on.

use std::collections::HashSet;

use cc_01_block_dag::BlockDag;
use shared_types::{short_hex, BlockHash, ValidatorId};
use tracing::warn;

/// Latest-message tips of every bonded validator, in validator order.
///
/// Equivocators contribute every competing tip. Validators with no weight in
/// the current table are left out: they neither move the LCA nor add score.
pub fn voting_tips(dag: &BlockDag) -> Vec<(ValidatorId, Vec<BlockHash>)> {
    let weights = dag.weights();
    dag.latest_messages()
        .filter(|(validator, _)| weights.is_bonded(validator))
        .map(|(validator, latest)| (validator, latest.hashes().to_vec()))
        .collect()
}

/// Highest block contained in the inclusive ancestor set of every voting tip.
///
/// Ties on height go to the smallest hash. Returns genesis when nobody has
/// voted, or when depth-capped walks share no block.
pub fn latest_common_ancestor(dag: &BlockDag, max_depth: usize) -> BlockHash {
    let tips = voting_tips(dag);
    let mut common: Option<HashSet<BlockHash>> = None;
    let mut truncated = false;

    for tip in tips.iter().flat_map(|(_, hashes)| hashes) {
        let ancestry = dag.ancestors_bounded(tip, max_depth);
        truncated |= ancestry.truncated;
        common = Some(match common {
            None => ancestry.hashes,
            Some(mut acc) => {
                acc.retain(|h| ancestry.hashes.contains(h));
                acc
            }
        });
    }

    let Some(common) = common else {
        return *dag.genesis();
    };

    let best = common
        .iter()
        .filter_map(|h| dag.height(h).map(|height| (height, *h)))
        .max_by(|(ha, a), (hb, b)| ha.cmp(hb).then_with(|| b.cmp(a)))
        .map(|(_, h)| h);

    match best {
        Some(lca) => lca,
        None => {
            warn!(
                truncated,
                tips = tips.len(),
                genesis = %short_hex(dag.genesis()),
                "No common ancestor within traversal depth, falling back to genesis"
            );
            *dag.genesis()
        }
    }
}
