//! # Block DAG
//!
//! Append-only store of admitted blocks plus the indices fork choice and
//! finality read: latest messages, equivocations, heights and the finalized
//! set.
//!
//! All indices are persistent maps, so `clone()` is O(1) and a clone is an
//! isolated snapshot: later inserts into one copy never show up in another.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use im::{HashMap as ImHashMap, HashSet as ImHashSet, OrdMap, OrdSet};
use shared_types::{short_hex, Block, BlockHash, ValidatorId};
use tracing::{debug, error, info, warn};

use super::messages::{Ancestry, EquivocationEvidence, InsertOutcome, LatestMessage};
use super::weights::ValidatorWeights;
use crate::error::{DagError, DagResult};

/// Default cap on parent-edge hops for ancestor walks.
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: usize = 1000;

/// DAG tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagConfig {
    /// Maximum parent-edge hops for [`BlockDag::ancestors`].
    pub max_traversal_depth: usize,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    block: Arc<Block>,
    height: u64,
}

/// The block DAG.
#[derive(Clone)]
pub struct BlockDag {
    genesis: BlockHash,
    blocks: ImHashMap<BlockHash, Entry>,
    children: ImHashMap<BlockHash, OrdSet<BlockHash>>,
    by_sender_seq: ImHashMap<(ValidatorId, u64), OrdSet<BlockHash>>,
    by_height: OrdMap<u64, OrdSet<BlockHash>>,
    latest: OrdMap<ValidatorId, OrdSet<BlockHash>>,
    equivocations: OrdMap<ValidatorId, OrdMap<u64, OrdSet<BlockHash>>>,
    finalized: ImHashSet<BlockHash>,
    last_finalized: BlockHash,
    weights: Arc<ValidatorWeights>,
    config: DagConfig,
}

impl BlockDag {
    /// Create a DAG rooted at `genesis`, which starts out finalized.
    pub fn new(genesis: Block, config: DagConfig) -> DagResult<Self> {
        if !genesis.is_genesis() {
            return Err(DagError::InvalidGenesis("genesis must not have parents".into()));
        }
        if !genesis.justifications.is_empty() {
            return Err(DagError::InvalidGenesis(
                "genesis must not carry justifications".into(),
            ));
        }

        let hash = genesis.hash;
        let weights = Arc::new(ValidatorWeights::new(0, hash, &genesis.bonds));
        info!(
            genesis = %short_hex(&hash),
            validators = weights.len(),
            total_weight = %weights.total(),
            "Block DAG initialized"
        );

        let mut blocks = ImHashMap::new();
        blocks.insert(
            hash,
            Entry {
                block: Arc::new(genesis),
                height: 0,
            },
        );
        let mut by_height = OrdMap::new();
        by_height.insert(0, OrdSet::unit(hash));

        Ok(Self {
            genesis: hash,
            blocks,
            children: ImHashMap::new(),
            by_sender_seq: ImHashMap::new(),
            by_height,
            latest: OrdMap::new(),
            equivocations: OrdMap::new(),
            finalized: ImHashSet::unit(hash),
            last_finalized: hash,
            weights,
            config,
        })
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Append a block whose dependencies are all present.
    ///
    /// Updates the latest-message index: the block replaces the tip named by
    /// its creator justification. A block that reuses a `(sender, seq_num)`
    /// pair is stored and reported as an equivocation.
    pub fn insert(&mut self, block: Block) -> DagResult<InsertOutcome> {
        let hash = block.hash;
        if self.blocks.contains_key(&hash) {
            return Err(DagError::AlreadyExists { hash });
        }
        if block.is_genesis() {
            return Err(DagError::InvalidGenesis(format!(
                "second parentless block {}",
                short_hex(&hash)
            )));
        }
        let missing = self.missing_dependencies(&block);
        if !missing.is_empty() {
            return Err(DagError::MissingDependencies { hash, missing });
        }

        let height = 1 + block
            .parent_hashes
            .iter()
            .filter_map(|p| self.height(p))
            .max()
            .unwrap_or(0);
        let sender = block.sender;
        let seq_num = block.seq_num;

        for parent in &block.parent_hashes {
            let mut kids = self.children.get(parent).cloned().unwrap_or_default();
            kids.insert(hash);
            self.children.insert(*parent, kids);
        }

        let mut at_height = self.by_height.get(&height).cloned().unwrap_or_default();
        at_height.insert(hash);
        self.by_height.insert(height, at_height);

        let mut same_seq = self
            .by_sender_seq
            .get(&(sender, seq_num))
            .cloned()
            .unwrap_or_default();
        same_seq.insert(hash);
        let equivocation = if same_seq.len() > 1 {
            let mut per_seq = self.equivocations.get(&sender).cloned().unwrap_or_default();
            per_seq.insert(seq_num, same_seq.clone());
            self.equivocations.insert(sender, per_seq);
            warn!(
                validator = %sender,
                seq_num,
                competing = same_seq.len(),
                "Equivocation recorded"
            );
            Some(EquivocationEvidence {
                validator: sender,
                seq_num,
                competing: same_seq.iter().copied().collect(),
            })
        } else {
            None
        };
        self.by_sender_seq.insert((sender, seq_num), same_seq);

        let mut tips = self.latest.get(&sender).cloned().unwrap_or_default();
        if let Some(previous) = block.creator_justification() {
            tips.remove(previous);
        }
        tips.insert(hash);
        self.latest.insert(sender, tips);

        self.blocks.insert(
            hash,
            Entry {
                block: Arc::new(block),
                height,
            },
        );

        debug!(
            block = %short_hex(&hash),
            sender = %sender,
            seq_num,
            height,
            "Block inserted into DAG"
        );

        Ok(InsertOutcome {
            hash,
            height,
            equivocation,
        })
    }

    /// Finalize `hash` and every ancestor of it.
    ///
    /// Returns the newly finalized hashes ordered by `(height, hash)`. The
    /// block must descend from the current last finalized block; weights are
    /// rebuilt from its bonds.
    pub fn mark_finalized(&mut self, hash: &BlockHash) -> DagResult<Vec<BlockHash>> {
        let bonds = match self.blocks.get(hash) {
            Some(entry) => entry.block.bonds.clone(),
            None => return Err(DagError::UnknownBlock { hash: *hash }),
        };
        if self.finalized.contains(hash) {
            return Ok(Vec::new());
        }

        let mut newly = Vec::new();
        let mut reaches_last_finalized = false;
        let mut seen = HashSet::from([*hash]);
        let mut queue = VecDeque::from([*hash]);
        while let Some(current) = queue.pop_front() {
            if current == self.last_finalized {
                reaches_last_finalized = true;
                continue;
            }
            if self.finalized.contains(&current) {
                continue;
            }
            newly.push(current);
            for parent in self.parents(&current) {
                if seen.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }

        if !reaches_last_finalized {
            return Err(DagError::FinalityConflict {
                hash: *hash,
                last_finalized: self.last_finalized,
            });
        }

        newly.sort_by_key(|h| (self.height(h).unwrap_or(0), *h));
        for h in &newly {
            self.finalized.insert(*h);
        }
        self.last_finalized = *hash;
        self.weights = Arc::new(ValidatorWeights::new(
            self.weights.version() + 1,
            *hash,
            &bonds,
        ));

        info!(
            block = %short_hex(hash),
            height = self.height(hash).unwrap_or(0),
            newly_finalized = newly.len(),
            weights_version = self.weights.version(),
            "Blocks finalized"
        );
        Ok(newly)
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub fn genesis(&self) -> &BlockHash {
        &self.genesis
    }

    pub fn get(&self, hash: &BlockHash) -> Option<&Arc<Block>> {
        self.blocks.get(hash).map(|e| &e.block)
    }

    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.blocks.contains_key(hash)
    }

    /// Height of a stored block: genesis is 0, otherwise one above its
    /// highest parent.
    pub fn height(&self, hash: &BlockHash) -> Option<u64> {
        self.blocks.get(hash).map(|e| e.height)
    }

    /// Number of stored blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the genesis block is stored from construction.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parents of a stored block; empty for genesis or unknown hashes.
    pub fn parents(&self, hash: &BlockHash) -> &[BlockHash] {
        match self.blocks.get(hash) {
            Some(entry) => &entry.block.parent_hashes,
            None => &[],
        }
    }

    /// Children of a block, in hash order.
    pub fn children(&self, hash: &BlockHash) -> Vec<BlockHash> {
        self.children
            .get(hash)
            .map(|kids| kids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Hashes among `block`'s dependencies not yet stored. Sorted, no
    /// duplicates.
    pub fn missing_dependencies(&self, block: &Block) -> Vec<BlockHash> {
        block
            .dependencies()
            .filter(|h| !self.blocks.contains_key(*h))
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Stored blocks from `validator` at `seq_num`, in hash order.
    pub fn blocks_at(&self, validator: &ValidatorId, seq_num: u64) -> Vec<BlockHash> {
        self.by_sender_seq
            .get(&(*validator, seq_num))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Blocks strictly above `height`, ordered by `(height, hash)`.
    pub fn blocks_above(&self, height: u64) -> impl Iterator<Item = (u64, BlockHash)> + '_ {
        self.by_height
            .range(height.saturating_add(1)..)
            .flat_map(|(h, hashes)| hashes.iter().map(move |hash| (*h, *hash)))
    }

    /// Greatest height of any stored block.
    pub fn max_height(&self) -> u64 {
        self.by_height.get_max().map(|(h, _)| *h).unwrap_or(0)
    }

    // =========================================================================
    // LATEST MESSAGES & EQUIVOCATIONS
    // =========================================================================

    /// Latest message of every validator that has produced a block, in
    /// validator order.
    pub fn latest_messages(&self) -> impl Iterator<Item = (ValidatorId, LatestMessage)> + '_ {
        self.latest.iter().filter_map(|(validator, tips)| {
            LatestMessage::from_sorted(tips.iter().copied().collect()).map(|m| (*validator, m))
        })
    }

    pub fn latest_message(&self, validator: &ValidatorId) -> Option<LatestMessage> {
        self.latest
            .get(validator)
            .and_then(|tips| LatestMessage::from_sorted(tips.iter().copied().collect()))
    }

    pub fn has_latest_messages(&self) -> bool {
        !self.latest.is_empty()
    }

    /// Validators with at least one recorded equivocation.
    pub fn equivocators(&self) -> impl Iterator<Item = &ValidatorId> {
        self.equivocations.keys()
    }

    pub fn is_equivocator(&self, validator: &ValidatorId) -> bool {
        self.equivocations.contains_key(validator)
    }

    /// Every equivocation recorded for `validator`, by sequence number.
    pub fn equivocations_of(&self, validator: &ValidatorId) -> Vec<EquivocationEvidence> {
        self.equivocations
            .get(validator)
            .map(|per_seq| {
                per_seq
                    .iter()
                    .map(|(seq_num, hashes)| EquivocationEvidence {
                        validator: *validator,
                        seq_num: *seq_num,
                        competing: hashes.iter().copied().collect(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // FINALITY & WEIGHTS
    // =========================================================================

    pub fn last_finalized(&self) -> &BlockHash {
        &self.last_finalized
    }

    pub fn is_finalized(&self, hash: &BlockHash) -> bool {
        self.finalized.contains(hash)
    }

    pub fn finalized_count(&self) -> usize {
        self.finalized.len()
    }

    /// Weights sourced from the last finalized block's bonds.
    pub fn weights(&self) -> &Arc<ValidatorWeights> {
        &self.weights
    }

    pub fn config(&self) -> &DagConfig {
        &self.config
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    /// Ancestors of `start`, inclusive, within the configured depth cap.
    pub fn ancestors(&self, start: &BlockHash) -> Ancestry {
        self.ancestors_bounded(start, self.config.max_traversal_depth)
    }

    /// Breadth-first parent walk from `start`, at most `max_depth` hops.
    pub fn ancestors_bounded(&self, start: &BlockHash, max_depth: usize) -> Ancestry {
        let mut ancestry = Ancestry::default();
        if !self.blocks.contains_key(start) {
            self.report_dangling(start);
            return ancestry;
        }

        ancestry.hashes.insert(*start);
        let mut queue = VecDeque::from([(*start, 0usize)]);
        while let Some((current, depth)) = queue.pop_front() {
            for parent in self.parents(&current) {
                if ancestry.hashes.contains(parent) {
                    continue;
                }
                if depth >= max_depth {
                    ancestry.truncated = true;
                    continue;
                }
                if !self.blocks.contains_key(parent) {
                    self.report_dangling(parent);
                    continue;
                }
                ancestry.hashes.insert(*parent);
                queue.push_back((*parent, depth + 1));
            }
        }

        if ancestry.truncated {
            warn!(
                start = %short_hex(start),
                max_depth,
                visited = ancestry.hashes.len(),
                "Ancestor walk truncated at depth cap"
            );
        }
        ancestry
    }

    /// True when `descendant` is `ancestor` or reaches it through parent
    /// edges. Unknown hashes never match.
    pub fn descends_from(&self, descendant: &BlockHash, ancestor: &BlockHash) -> bool {
        let Some(floor) = self.height(ancestor) else {
            return false;
        };
        if descendant == ancestor {
            return true;
        }
        match self.height(descendant) {
            Some(h) if h > floor => {}
            _ => return false,
        }

        let mut seen = HashSet::from([*descendant]);
        let mut queue = VecDeque::from([*descendant]);
        while let Some(current) = queue.pop_front() {
            for parent in self.parents(&current) {
                if parent == ancestor {
                    return true;
                }
                match self.height(parent) {
                    Some(h) if h > floor => {
                        if seen.insert(*parent) {
                            queue.push_back(*parent);
                        }
                    }
                    Some(_) => {}
                    None => self.report_dangling(parent),
                }
            }
        }
        false
    }

    /// True when `ancestor` is a proper ancestor of `descendant`.
    pub fn is_strict_ancestor(&self, ancestor: &BlockHash, descendant: &BlockHash) -> bool {
        ancestor != descendant && self.descends_from(descendant, ancestor)
    }

    fn report_dangling(&self, hash: &BlockHash) {
        error!(block = %short_hex(hash), "Reachable block missing from DAG");
        debug_assert!(
            self.blocks.contains_key(hash),
            "dangling reference to {}",
            short_hex(hash)
        );
    }
}

impl fmt::Debug for BlockDag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDag")
            .field("genesis", &short_hex(&self.genesis))
            .field("blocks", &self.blocks.len())
            .field("validators", &self.latest.len())
            .field("equivocators", &self.equivocations.len())
            .field("last_finalized", &short_hex(&self.last_finalized))
            .field("weights_version", &self.weights.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{validator, DagBuilder};

    fn three_validators() -> DagBuilder {
        DagBuilder::new(&[(validator(1), 10), (validator(2), 20), (validator(3), 30)])
    }

    #[test]
    fn test_genesis_only_dag() {
        let builder = three_validators();
        let dag = builder.dag();

        assert_eq!(dag.len(), 1);
        assert_eq!(dag.height(dag.genesis()), Some(0));
        assert!(dag.is_finalized(dag.genesis()));
        assert_eq!(dag.last_finalized(), dag.genesis());
        assert!(!dag.has_latest_messages());
        assert_eq!(dag.weights().total(), 60);
        assert_eq!(dag.weights().version(), 0);
    }

    #[test]
    fn test_genesis_with_parents_rejected() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let block = builder.make_block(validator(1), 0, &[g], &[]);

        let err = BlockDag::new(block, DagConfig::default()).unwrap_err();
        assert!(matches!(err, DagError::InvalidGenesis(_)));
    }

    #[test]
    fn test_height_is_one_above_highest_parent() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let a2 = builder.block(validator(1), &[a1]);
        let b1 = builder.block(validator(2), &[g]);
        let c1 = builder.block(validator(3), &[a2, b1]);

        let dag = builder.dag();
        assert_eq!(dag.height(&a1), Some(1));
        assert_eq!(dag.height(&a2), Some(2));
        assert_eq!(dag.height(&b1), Some(1));
        assert_eq!(dag.height(&c1), Some(3));
        assert_eq!(dag.max_height(), 3);
        assert_eq!(dag.children(&g).len(), 2);
    }

    #[test]
    fn test_missing_dependencies_rejected() {
        let mut builder = three_validators();
        let block = builder.make_block(validator(1), 0, &[[0xEE; 32]], &[]);
        let hash = block.hash;

        let err = builder.insert(block).unwrap_err();
        assert_eq!(
            err,
            DagError::MissingDependencies {
                hash,
                missing: vec![[0xEE; 32]],
            }
        );
        assert!(!builder.dag().contains(&hash));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let block = builder.make_block(validator(1), 0, &[g], &[]);

        builder.insert(block.clone()).unwrap();
        let err = builder.insert(block.clone()).unwrap_err();
        assert_eq!(err, DagError::AlreadyExists { hash: block.hash });
    }

    #[test]
    fn test_latest_message_follows_creator_justification() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let a2 = builder.block(validator(1), &[a1]);

        let latest = builder.dag().latest_message(&validator(1)).unwrap();
        assert_eq!(latest, LatestMessage::Single(a2));
        assert!(builder.dag().latest_message(&validator(2)).is_none());
    }

    #[test]
    fn test_equivocation_tracked() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let a1_prime = builder.equivocate(validator(1), 0, &[g], &[]);

        let dag = builder.dag();
        assert!(dag.contains(&a1) && dag.contains(&a1_prime));
        assert!(dag.is_equivocator(&validator(1)));
        assert_eq!(dag.equivocators().count(), 1);

        let latest = dag.latest_message(&validator(1)).unwrap();
        assert!(latest.is_equivocated());
        assert_eq!(latest.hashes().len(), 2);

        let evidence = dag.equivocations_of(&validator(1));
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].seq_num, 0);
        assert_eq!(dag.blocks_at(&validator(1), 0).len(), 2);
    }

    #[test]
    fn test_insert_reports_equivocation_evidence() {
        let mut builder = three_validators();
        let g = builder.genesis();
        builder.block(validator(2), &[g]);
        let twin = builder.make_block(validator(2), 0, &[g], &[]);

        let outcome = builder.insert(twin).unwrap();
        let evidence = outcome.equivocation.unwrap();
        assert_eq!(evidence.validator, validator(2));
        assert_eq!(evidence.competing.len(), 2);
    }

    #[test]
    fn test_snapshot_isolation() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let snapshot = builder.dag().clone();

        let a1 = builder.block(validator(1), &[g]);

        assert!(builder.dag().contains(&a1));
        assert!(!snapshot.contains(&a1));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_ancestors_inclusive() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let b1 = builder.block(validator(2), &[a1]);

        let ancestry = builder.dag().ancestors(&b1);
        assert!(!ancestry.truncated);
        assert_eq!(ancestry.hashes, HashSet::from([b1, a1, g]));
    }

    #[test]
    fn test_ancestors_truncate_at_depth_cap() {
        let mut builder = three_validators();
        let mut tip = builder.genesis();
        for _ in 0..10 {
            tip = builder.block(validator(1), &[tip]);
        }

        let ancestry = builder.dag().ancestors_bounded(&tip, 3);
        assert!(ancestry.truncated);
        assert_eq!(ancestry.hashes.len(), 4);
    }

    #[test]
    fn test_descends_from() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let b1 = builder.block(validator(2), &[g]);
        let c1 = builder.block(validator(3), &[a1]);

        let dag = builder.dag();
        assert!(dag.descends_from(&c1, &a1));
        assert!(dag.descends_from(&c1, &g));
        assert!(dag.descends_from(&c1, &c1));
        assert!(!dag.descends_from(&c1, &b1));
        assert!(!dag.descends_from(&a1, &c1));
        assert!(dag.is_strict_ancestor(&a1, &c1));
        assert!(!dag.is_strict_ancestor(&c1, &c1));
    }

    #[test]
    fn test_mark_finalized_closes_over_ancestors() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let b1 = builder.block(validator(2), &[g]);
        let c1 = builder.block(validator(3), &[a1, b1]);

        let newly = builder.finalize(c1);

        assert_eq!(newly.len(), 3);
        assert_eq!(newly.last(), Some(&c1));
        let dag = builder.dag();
        assert!(dag.is_finalized(&a1) && dag.is_finalized(&b1) && dag.is_finalized(&c1));
        assert_eq!(dag.last_finalized(), &c1);
        assert_eq!(dag.weights().version(), 1);
        assert_eq!(dag.weights().source(), &c1);
    }

    #[test]
    fn test_mark_finalized_rejects_conflicting_branch() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let b1 = builder.block(validator(2), &[g]);
        builder.finalize(a1);

        let err = builder.dag_mut().mark_finalized(&b1).unwrap_err();
        assert_eq!(
            err,
            DagError::FinalityConflict {
                hash: b1,
                last_finalized: a1
            }
        );
        assert!(!builder.dag().is_finalized(&b1));
    }

    #[test]
    fn test_mark_finalized_is_idempotent() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        builder.finalize(a1);

        let again = builder.dag_mut().mark_finalized(&a1).unwrap();
        assert!(again.is_empty());
        assert_eq!(builder.dag().weights().version(), 1);
    }

    #[test]
    fn test_blocks_above_ordered_by_height_then_hash() {
        let mut builder = three_validators();
        let g = builder.genesis();
        let a1 = builder.block(validator(1), &[g]);
        let b1 = builder.block(validator(2), &[g]);
        let c1 = builder.block(validator(3), &[a1]);

        let above: Vec<_> = builder.dag().blocks_above(0).collect();
        let mut expected_level1 = vec![a1, b1];
        expected_level1.sort();
        assert_eq!(
            above,
            vec![(1, expected_level1[0]), (1, expected_level1[1]), (2, c1)]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn finalized_set_is_ancestor_closed(choices in proptest::collection::vec((0u8..3, 0usize..4), 1..25)) {
                let mut builder = three_validators();
                let mut hashes = vec![builder.genesis()];
                for (v, back) in choices {
                    let parent = hashes[hashes.len().saturating_sub(1 + back)];
                    hashes.push(builder.block(validator(v + 1), &[parent]));
                }
                let target = *hashes.last().unwrap();
                builder.finalize(target);

                let dag = builder.dag();
                for h in dag.ancestors_bounded(&target, usize::MAX).hashes {
                    prop_assert!(dag.is_finalized(&h));
                }
            }
        }
    }
}
