//! Reference scenarios, each run end to end with signed blocks.

use std::collections::{BTreeMap, BTreeSet};

use cc_03_validation::{AdmissionOutcome, ConsensusViolation, RejectReason};
use cc_04_finality::{fault_tolerance, FaultTolerance, FinalityApi, FinalizedBlockEvent};

use crate::fixtures::Network;

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;

#[tokio::test]
async fn test_simple_convergence_reaches_full_tolerance() {
    let mut net = Network::new(&[30, 25, 45]);
    let g = net.genesis();

    let x = net.extend(A, &[g]).await;
    let b1 = net.extend(B, &[x]).await;
    let c1 = net.extend(C, &[b1]).await;
    // Second round: everyone has now seen everyone build on X.
    let a2 = net.extend(A, &[c1]).await;
    let b2 = net.extend(B, &[a2]).await;
    net.extend(C, &[b2]).await;

    assert_eq!(fault_tolerance(&x, &net.store.snapshot()), FaultTolerance::MAX);

    let finality = net.finality();
    let events = finality.run_once().await.unwrap();
    assert_eq!(
        events,
        vec![FinalizedBlockEvent {
            block_hash: x,
            height: 1
        }]
    );
}

#[tokio::test]
async fn test_partial_support_finalizes_at_positive_tolerance() {
    let mut net = Network::new(&[35, 32, 33]);
    let g = net.genesis();

    let x = net.extend(A, &[g]).await;
    net.extend(B, &[g]).await;
    let c1 = net.extend(C, &[x]).await;
    let a2 = net.extend(A, &[c1]).await;
    net.extend(C, &[a2]).await;

    let ft = fault_tolerance(&x, &net.store.snapshot());
    assert_eq!(ft, FaultTolerance::new(36, 100));
    assert_eq!(ft.to_string(), "9/25");

    let finality = net.finality();
    assert_eq!(finality.fault_tolerance(x).await.unwrap(), ft);
    let events = finality.run_once().await.unwrap();
    assert_eq!(events[0].block_hash, x);
    assert_eq!(net.store.snapshot().last_finalized(), &x);
}

#[tokio::test]
async fn test_unknown_parent_is_pending_and_dag_unchanged() {
    let mut net = Network::new(&[50, 50]);
    let g = net.genesis();
    let unknown = [0x77; 32];
    let before = net.store.snapshot().len();

    let dag = net.store.snapshot();
    let block = net.factory.build_with(
        &dag,
        A,
        0,
        &[unknown],
        BTreeMap::from([(net.factory.validator(A), g)]),
        Vec::new(),
    );

    let outcome = net.admit(block).await;
    assert_eq!(outcome, AdmissionOutcome::Pending(BTreeSet::from([unknown])));
    assert_eq!(net.store.snapshot().len(), before);
}

#[tokio::test]
async fn test_skipped_sequence_number_is_rejected() {
    let mut net = Network::new(&[50, 50]);
    let g = net.genesis();
    let dag = net.store.snapshot();
    let block = net.factory.build_with(
        &dag,
        A,
        5,
        &[g],
        BTreeMap::from([(net.factory.validator(A), g)]),
        Vec::new(),
    );

    let outcome = net.admit(block).await;
    assert_eq!(
        outcome,
        AdmissionOutcome::Rejected(RejectReason::Consensus(
            ConsensusViolation::SkippedSequenceNumber {
                validator: net.factory.validator(A),
                seq_num: 5,
            }
        ))
    );
}

#[tokio::test]
async fn test_one_sided_support_does_not_finalize() {
    let mut net = Network::new(&[50, 50]);
    let g = net.genesis();

    let x = net.extend(A, &[g]).await;
    // B builds on X but A never sees it.
    net.extend(B, &[x]).await;

    assert_eq!(fault_tolerance(&x, &net.store.snapshot()), FaultTolerance::ZERO);
    assert!(net.finality().run_once().await.unwrap().is_empty());
}
