//! A node without a network: peers' blocks are handed to its admission
//! queue directly, in any order.

use std::sync::Arc;
use std::time::Duration;

use cc_01_block_dag::BlockDag;
use cc_02_fork_choice::Estimator;
use cc_03_validation::test_utils::{deploy, SigningValidator};
use cc_03_validation::{
    AdmissionOutcome, HashChainExecutionEngine, Secp256k1Blake3Provider, SystemTimeSource,
    TimeSource,
};
use cc_04_finality::FinalityApi;
use node_runtime::{BlockProposer, GenesisConfig, NodeConfig, NodeRuntime};
use shared_crypto::Secp256k1KeyPair;
use shared_types::Block;

type Peer = BlockProposer<Secp256k1Blake3Provider, HashChainExecutionEngine>;

fn peer(seed: u8) -> Peer {
    BlockProposer::new(
        Secp256k1KeyPair::from_bytes([seed; 32]).unwrap(),
        Arc::new(Secp256k1Blake3Provider),
        Arc::new(HashChainExecutionEngine),
        Arc::new(Estimator::default()),
    )
}

fn observer_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.genesis = GenesisConfig {
        bonds: vec![(SigningValidator::new(1).id, 50), (SigningValidator::new(2).id, 50)],
        timestamp: 0,
        chain_name: "node-test".into(),
    };
    config.finality.tick_interval = Duration::from_millis(10);
    config
}

async fn propose(peer: &Peer, dag: &BlockDag, payload: &[u8]) -> Block {
    peer.propose(dag, vec![deploy(payload)], SystemTimeSource.now_millis())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_observer_finalizes_peer_blocks_received_out_of_order() {
    let runtime = NodeRuntime::start(observer_config()).unwrap();
    let mut events = runtime.container().finality.subscribe();
    let store = Arc::clone(&runtime.container().store);
    let (alice, bob) = (peer(1), peer(2));

    let a0 = propose(&alice, &store.snapshot(), b"a0").await;
    assert!(runtime.admission().submit(a0.clone()).await.unwrap().is_admitted());
    let b0 = propose(&bob, &store.snapshot(), b"b0").await;
    assert!(runtime.admission().submit(b0).await.unwrap().is_admitted());

    // Bob builds on a block the node has not seen yet.
    let a1 = propose(&alice, &store.snapshot(), b"a1").await;
    let mut ahead = (*store.snapshot()).clone();
    ahead.insert(a1.clone()).unwrap();
    let b1 = propose(&bob, &ahead, b"b1").await;

    match runtime.admission().submit(b1.clone()).await.unwrap() {
        AdmissionOutcome::Pending(missing) => assert!(missing.contains(&a1.hash)),
        other => panic!("expected Pending, got {other:?}"),
    }
    assert_eq!(runtime.admission().pending_count().await.unwrap(), 1);

    assert!(runtime.admission().submit(a1).await.unwrap().is_admitted());
    assert_eq!(runtime.admission().pending_count().await.unwrap(), 0);
    assert!(store.snapshot().contains(&b1.hash));

    let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.block_hash, a0.hash);
    assert_eq!(event.height, 1);
    assert!(store.snapshot().is_finalized(&a0.hash));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_forged_signature_is_rejected_by_node() {
    let runtime = NodeRuntime::start(observer_config()).unwrap();
    let store = Arc::clone(&runtime.container().store);

    let mut forged = propose(&peer(1), &store.snapshot(), b"forged").await;
    forged.signature = vec![0u8; forged.signature.len()];

    let outcome = runtime.admission().submit(forged.clone()).await.unwrap();
    assert!(matches!(outcome, AdmissionOutcome::Rejected(_)), "{outcome:?}");
    assert!(!store.snapshot().contains(&forged.hash));

    runtime.shutdown().await;
}
