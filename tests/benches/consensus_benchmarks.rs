//! # Casper-Core Benchmarks
//!
//! | Subsystem | Operation |
//! |-----------|-----------|
//! | cc-02 Fork Choice | parent selection on a wide DAG |
//! | cc-03 Validation | full pipeline admission of one block |
//! | cc-04 Finality | fault tolerance and candidate scan |

use std::time::Duration;

use cc_01_block_dag::test_utils::{validator, DagBuilder};
use cc_01_block_dag::BlockDag;
use cc_02_fork_choice::Estimator;
use cc_03_validation::test_utils::BlockFactory;
use cc_03_validation::BlockAdmission;
use cc_04_finality::{FaultTolerance, SafetyOracle};
use cc_tests::fixtures::pipeline;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

/// `rounds` rounds in which every validator builds on every tip of the
/// previous round.
fn layered_dag(validators: u8, rounds: usize) -> BlockDag {
    let bonds: Vec<_> = (1..=validators).map(|n| (validator(n), 10)).collect();
    let mut builder = DagBuilder::new(&bonds);
    let mut tips = vec![builder.genesis()];
    for _ in 0..rounds {
        tips = (1..=validators)
            .map(|n| builder.block(validator(n), &tips))
            .collect();
    }
    builder.into_dag()
}

// ============================================================================
// CC-02: Fork Choice
// ============================================================================

fn bench_fork_choice(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-02-fork-choice");
    group.measurement_time(Duration::from_secs(10));

    let estimator = Estimator::default();
    for validators in [4u8, 16, 32] {
        let dag = layered_dag(validators, 20);
        group.bench_with_input(
            BenchmarkId::new("select_parents", validators),
            &dag,
            |b, dag| b.iter(|| black_box(estimator.select_parents(dag))),
        );
    }

    group.finish();
}

// ============================================================================
// CC-03: Validation Pipeline
// ============================================================================

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-03-validation");
    let rt = tokio::runtime::Runtime::new().unwrap();

    let pipeline = pipeline();
    let mut factory = BlockFactory::new(&[40, 30, 30]);
    let seed = factory.store();
    let genesis = *seed.snapshot().genesis();
    let block = factory.build(&seed.snapshot(), 0, &[genesis], Vec::new());

    group.bench_function("admit_on_genesis", |b| {
        b.iter_batched(
            || (factory.store(), block.clone()),
            |(store, block)| rt.block_on(async { black_box(pipeline.admit(block, &store).await) }),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// CC-04: Finality
// ============================================================================

fn bench_finality(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-04-finality");
    group.measurement_time(Duration::from_secs(10));

    let oracle = SafetyOracle::default();
    for validators in [4u8, 16, 32] {
        let dag = layered_dag(validators, 10);
        let genesis = *dag.genesis();
        let target = dag
            .blocks_above(0)
            .into_iter()
            .map(|(_, hash)| hash)
            .next()
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("fault_tolerance", validators),
            &dag,
            |b, dag| b.iter(|| black_box(oracle.fault_tolerance(&target, dag))),
        );
        group.bench_with_input(BenchmarkId::new("finalize", validators), &dag, |b, dag| {
            b.iter(|| black_box(oracle.finalize(dag, &genesis, FaultTolerance::ZERO)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fork_choice, bench_validation, bench_finality);
criterion_main!(benches);
