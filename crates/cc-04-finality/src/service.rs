//! Finality Service - the finalization loop
//!
//! Each tick takes a DAG snapshot, runs the safety oracle on the blocking
//! pool under a timeout that cancels it, and finalizes at most one candidate
//! together with its ancestors. Side effects follow the DAG update; their failures
//! are logged and never undo finality.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cc_01_block_dag::{BlockDag, DagError, DagStore};
use shared_types::{short_hex, BlockHash};
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::domain::{
    FaultTolerance, SafetyOracle, ScanCancel, DEFAULT_EXACT_CLIQUE_MAX_VALIDATORS,
};
use crate::error::{FinalityError, FinalityResult};
use crate::events::FinalizedBlockEvent;
use crate::ports::inbound::FinalityApi;
use crate::ports::outbound::{BlockPruner, DeployPool, ExecutionStateNotifier};

/// Finality configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalityConfig {
    /// A candidate finalizes when its fault tolerance is strictly above this.
    /// `0` requires a clique holding more than half the weight; raising it
    /// trades liveness for margin, lowering it below `0` is unsafe.
    pub threshold: FaultTolerance,
    /// Interval between oracle scans.
    pub tick_interval: Duration,
    /// Timeout for one oracle scan; an overrunning scan is cancelled.
    pub oracle_timeout: Duration,
    /// Keep this many blocks below the finalized height; `None` disables
    /// pruning.
    pub keep_depth: Option<u64>,
    /// Supporter count above which the greedy clique is used.
    pub exact_clique_max_validators: usize,
    /// Buffer of the finalization event channel.
    pub event_capacity: usize,
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            threshold: FaultTolerance::ZERO,
            tick_interval: Duration::from_millis(1_000),
            oracle_timeout: Duration::from_millis(500),
            keep_depth: None,
            exact_clique_max_validators: DEFAULT_EXACT_CLIQUE_MAX_VALIDATORS,
            event_capacity: 1_024,
        }
    }
}

/// Dependencies for FinalityService
pub struct FinalityDependencies<P, N, R> {
    pub store: Arc<DagStore>,
    pub deploy_pool: Arc<P>,
    pub notifier: Arc<N>,
    pub pruner: Arc<R>,
    pub config: FinalityConfig,
}

/// Finality Service implementation
pub struct FinalityService<P, N, R>
where
    P: DeployPool,
    N: ExecutionStateNotifier,
    R: BlockPruner,
{
    store: Arc<DagStore>,
    deploy_pool: Arc<P>,
    notifier: Arc<N>,
    pruner: Arc<R>,
    oracle: SafetyOracle,
    config: FinalityConfig,
    events: broadcast::Sender<FinalizedBlockEvent>,
    // Set while a finalization scan runs on the blocking pool.
    scan_in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the scan ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P, N, R> FinalityService<P, N, R>
where
    P: DeployPool + 'static,
    N: ExecutionStateNotifier + 'static,
    R: BlockPruner + 'static,
{
    pub fn new(deps: FinalityDependencies<P, N, R>) -> Self {
        let (events, _) = broadcast::channel(deps.config.event_capacity.max(1));
        Self {
            store: deps.store,
            deploy_pool: deps.deploy_pool,
            notifier: deps.notifier,
            pruner: deps.pruner,
            oracle: SafetyOracle::new(deps.config.exact_clique_max_validators),
            config: deps.config,
            events,
            scan_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &FinalityConfig {
        &self.config
    }

    /// Run `scan` on the current snapshot off the async workers.
    ///
    /// On timeout the scan's cancel flag is set; `scan` is expected to poll
    /// it and stop. Its result is dropped either way.
    async fn run_oracle<T, F>(&self, scan: F) -> FinalityResult<T>
    where
        T: Send + 'static,
        F: FnOnce(SafetyOracle, &BlockDag, &ScanCancel) -> T + Send + 'static,
    {
        let snapshot = self.store.snapshot();
        let oracle = self.oracle;
        let cancel = ScanCancel::new();
        let scan_cancel = cancel.clone();
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || scan(oracle, &snapshot, &scan_cancel));
        let result = tokio::time::timeout(self.config.oracle_timeout, task).await;
        crate::metrics::record_oracle_duration(started.elapsed().as_secs_f64());

        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join)) => Err(FinalityError::OracleTaskFailed {
                reason: join.to_string(),
            }),
            Err(_) => {
                cancel.cancel();
                crate::metrics::record_oracle_timeout();
                Err(FinalityError::OracleTimeout {
                    timeout_ms: self.config.oracle_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Next block to finalize, if any.
    ///
    /// Fails with `OracleBusy` while a cancelled scan is still unwinding, so
    /// scans never pile up on the blocking pool.
    pub async fn find_candidate(&self) -> FinalityResult<Option<BlockHash>> {
        if self.scan_in_flight.swap(true, Ordering::AcqRel) {
            return Err(FinalityError::OracleBusy);
        }
        let in_flight = InFlight(Arc::clone(&self.scan_in_flight));
        let threshold = self.config.threshold;
        self.run_oracle(move |oracle, dag, cancel| {
            let _in_flight = in_flight;
            let last_finalized = *dag.last_finalized();
            oracle.finalize_cancellable(dag, &last_finalized, threshold, cancel)
        })
        .await?
        .map_err(FinalityError::from)
    }

    /// Finalize `target` and its ancestors, then run side effects.
    pub async fn apply_finalization(
        &self,
        target: BlockHash,
    ) -> FinalityResult<Vec<FinalizedBlockEvent>> {
        let newly = self.store.update(|dag| dag.mark_finalized(&target))?;
        let snapshot = self.store.snapshot();

        let mut deploys = Vec::new();
        let mut events = Vec::with_capacity(newly.len());
        for hash in &newly {
            if let Some(block) = snapshot.get(hash) {
                deploys.extend(block.deploys.iter().map(|d| d.hash));
            }
            events.push(FinalizedBlockEvent {
                block_hash: *hash,
                height: snapshot.height(hash).unwrap_or_default(),
            });
        }
        let height = snapshot.height(&target).unwrap_or_default();

        if !deploys.is_empty() {
            if let Err(err) = self.deploy_pool.remove(&deploys).await {
                self.side_effect_failed("deploy_pool", &err);
            }
        }
        if let Some(block) = snapshot.get(&target) {
            if let Err(err) = self.notifier.on_finalized(target, block.post_state_hash).await {
                self.side_effect_failed("execution_notifier", &err);
            }
        }
        if let Some(keep_depth) = self.config.keep_depth {
            let floor = height.saturating_sub(keep_depth);
            if floor > 0 {
                if let Err(err) = self.pruner.prune_below(floor).await {
                    self.side_effect_failed("pruner", &err);
                }
            }
        }

        for event in &events {
            // Err only means nobody is subscribed.
            let _ = self.events.send(*event);
        }

        info!(
            block = %short_hex(&target),
            height,
            newly_finalized = newly.len(),
            weights_version = snapshot.weights().version(),
            "Block finalized"
        );
        crate::metrics::record_finalized(newly.len() as u64, height);
        Ok(events)
    }

    fn side_effect_failed(&self, collaborator: &'static str, err: &FinalityError) {
        warn!(collaborator, error = %err, "Finalization side effect failed");
        crate::metrics::record_side_effect_failure(collaborator);
    }

    /// Tick until `shutdown` flips to true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            threshold = %self.config.threshold,
            "Finalization loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(_) => {}
                        Err(err) if err.is_transient() => {
                            warn!(error = %err, "Finality tick abandoned, retrying next tick");
                        }
                        Err(err) => error!(error = %err, "Finality tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Finalization loop stopped");
    }
}

#[async_trait]
impl<P, N, R> FinalityApi for FinalityService<P, N, R>
where
    P: DeployPool + 'static,
    N: ExecutionStateNotifier + 'static,
    R: BlockPruner + 'static,
{
    async fn run_once(&self) -> FinalityResult<Vec<FinalizedBlockEvent>> {
        match self.find_candidate().await? {
            Some(target) => self.apply_finalization(target).await,
            None => Ok(Vec::new()),
        }
    }

    async fn fault_tolerance(&self, block: BlockHash) -> FinalityResult<FaultTolerance> {
        self.run_oracle(move |oracle, dag, cancel| {
            if !dag.contains(&block) {
                return Err(FinalityError::from(DagError::UnknownBlock { hash: block }));
            }
            let report = oracle.analyze_cancellable(&block, dag, cancel)?;
            Ok(report.fault_tolerance)
        })
        .await?
    }

    fn subscribe(&self) -> broadcast::Receiver<FinalizedBlockEvent> {
        self.events.subscribe()
    }
}
