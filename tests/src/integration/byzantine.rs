//! Equivocations end to end: admitted, remembered, and never counted as
//! support.

use std::collections::BTreeMap;

use cc_03_validation::test_utils::deploy;
use cc_03_validation::AdmissionOutcome;
use cc_04_finality::{fault_tolerance, supporters, FaultTolerance, FinalityApi};
use shared_types::BlockHash;

use crate::fixtures::Network;

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;

/// Two seq-0 blocks from A, both on genesis.
async fn equivocate(net: &mut Network) -> (BlockHash, BlockHash) {
    let g = net.genesis();
    let first = net.extend(A, &[g]).await;

    let dag = net.store.snapshot();
    let second = net.factory.build_with(
        &dag,
        A,
        0,
        &[g],
        BTreeMap::from([(net.factory.validator(A), g)]),
        vec![deploy(b"fork")],
    );
    let second_hash = second.hash;
    match net.admit(second).await {
        AdmissionOutcome::Admitted(admitted) => {
            let evidence = admitted.direct_equivocation.expect("direct equivocation");
            assert_eq!(evidence.validator, net.factory.validator(A));
            assert_eq!(evidence.seq_num, 0);
            assert_eq!(evidence.competing.len(), 2);
        }
        other => panic!("equivocating block not admitted: {other:?}"),
    }
    (first, second_hash)
}

#[tokio::test]
async fn test_equivocation_round_trip() {
    let mut net = Network::new(&[40, 30, 30]);
    let (first, second) = equivocate(&mut net).await;

    let dag = net.store.snapshot();
    let a = net.factory.validator(A);
    assert!(dag.contains(&first));
    assert!(dag.contains(&second));
    assert!(dag.is_equivocator(&a));
    assert_eq!(dag.equivocators().collect::<Vec<_>>(), vec![&a]);

    let latest = dag.latest_message(&a).expect("latest message");
    assert!(latest.is_equivocated());
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(latest.hashes(), expected.as_slice());
}

#[tokio::test]
async fn test_equivocator_weight_is_not_support() {
    let mut net = Network::new(&[40, 30, 30]);
    let (first, _) = equivocate(&mut net).await;

    let b1 = net.extend(B, &[first]).await;
    let c1 = net.extend(C, &[b1]).await;
    let b2 = net.extend(B, &[c1]).await;
    net.extend(C, &[b2]).await;

    let dag = net.store.snapshot();
    let support = supporters(&first, &dag);
    assert!(!support.contains(&net.factory.validator(A)));
    assert_eq!(support.len(), 2);
    assert_eq!(fault_tolerance(&first, &dag), FaultTolerance::new(1, 5));

    let events = net.finality().run_once().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].block_hash, first);
}
