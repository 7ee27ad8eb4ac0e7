//! Finality invariants over random DAG growth.

use cc_01_block_dag::test_utils::{validator, DagBuilder};
use cc_01_block_dag::BlockDag;
use cc_04_finality::{fault_tolerance, finalize, FaultTolerance};
use proptest::prelude::*;
use shared_types::BlockHash;

fn assert_ancestor_closed(dag: &BlockDag, blocks: &[BlockHash]) {
    for hash in blocks.iter().filter(|h| dag.is_finalized(h)) {
        for parent in dag.parents(hash) {
            assert!(dag.is_finalized(parent), "finalized block with unfinalized parent");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn finality_only_moves_forward(
        steps in prop::collection::vec((0u8..3, any::<u16>()), 1..40),
        stakes in prop::collection::vec(1u64..100, 3),
    ) {
        let bonds: Vec<_> = (0..3).map(|i| (validator(i + 1), stakes[i as usize])).collect();
        let mut b = DagBuilder::new(&bonds);
        let mut blocks = vec![b.genesis()];
        let mut finalized: Vec<BlockHash> = vec![b.genesis()];

        for (creator, pick) in steps {
            let parent = blocks[pick as usize % blocks.len()];
            blocks.push(b.block(validator(creator + 1), &[parent]));

            let mut last = *b.dag().last_finalized();
            while let Some(next) = finalize(b.dag(), &last, FaultTolerance::ZERO) {
                prop_assert!(b.dag().descends_from(&next, &last));
                b.finalize(next);
                last = next;
                finalized.push(next);
            }

            let dag = b.dag();
            for hash in &finalized {
                prop_assert!(dag.is_finalized(hash));
            }
            assert_ancestor_closed(dag, &blocks);
        }

        let dag = b.dag();
        for hash in &blocks {
            let ft = fault_tolerance(hash, dag);
            prop_assert!(ft >= FaultTolerance::MIN && ft <= FaultTolerance::MAX);
        }
    }
}
