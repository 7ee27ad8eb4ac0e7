//! # Node Runtime
//!
//! Spawns the long-running tasks of a node and stops them on shutdown:
//!
//! - the admission queue (stops when the last handle is dropped)
//! - the finalization loop
//! - a finalization event logger
//! - the proposer loop, when a signing key is configured

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cc_03_validation::{AdmissionOutcome, SystemTimeSource, TimeSource};
use cc_04_finality::FinalityApi;
use shared_types::{short_hex, Deploy, DeployHash};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::admission::{AdmissionHandle, AdmissionQueue, BlockRequester, LoggingRequester};
use crate::container::{ContainerError, NodeConfig, NodeContainer, Proposer};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A running node.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
    admission: AdmissionHandle,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    /// Build every subsystem and spawn the node's tasks. Must be called from
    /// within a tokio runtime.
    pub fn start(config: NodeConfig) -> Result<Self, ContainerError> {
        Self::start_with_requester(config, Arc::new(LoggingRequester))
    }

    pub fn start_with_requester(
        config: NodeConfig,
        requester: Arc<dyn BlockRequester>,
    ) -> Result<Self, ContainerError> {
        let container = Arc::new(NodeContainer::new(config)?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let admission = AdmissionQueue::spawn(
            Arc::clone(&container.pipeline),
            Arc::clone(&container.store),
            requester,
            container.config.admission.clone(),
        );

        let mut tasks = Vec::new();

        let finality = Arc::clone(&container.finality);
        let finality_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            finality.run(finality_shutdown).await;
        }));

        tasks.push(tokio::spawn(log_finalized(
            container.finality.subscribe(),
            shutdown_rx.clone(),
        )));

        if let Some(proposer) = container.proposer.clone() {
            tasks.push(tokio::spawn(propose_loop(
                Arc::clone(&container),
                proposer,
                admission.clone(),
                shutdown_rx,
            )));
        }

        info!(tasks = tasks.len(), "Node runtime started");
        Ok(Self {
            container,
            admission,
            shutdown_tx,
            tasks,
        })
    }

    pub fn container(&self) -> &Arc<NodeContainer> {
        &self.container
    }

    /// Entry point for blocks from peers.
    pub fn admission(&self) -> &AdmissionHandle {
        &self.admission
    }

    /// Queue a deploy for inclusion. Returns false if already pooled.
    pub fn submit_deploy(&self, deploy: Deploy) -> bool {
        self.container.deploy_pool.add(deploy)
    }

    /// Signal every task and wait for them, up to a grace period.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            warn!("Every task had already stopped");
        }
        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Task ended abnormally"),
                Err(_) => warn!("Task did not stop within the grace period"),
            }
        }
        info!("Shutdown complete");
    }
}

async fn log_finalized(
    mut events: broadcast::Receiver<cc_04_finality::FinalizedBlockEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => info!(
                    block = %short_hex(&event.block_hash),
                    height = event.height,
                    "Finalized"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Finalization log fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn propose_loop(
    container: Arc<NodeContainer>,
    proposer: Arc<Proposer>,
    admission: AdmissionHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(container.config.proposer.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Deploys carried by admitted, not yet finalized, own blocks.
    let mut in_flight: HashSet<DeployHash> = HashSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !propose_once(&container, &proposer, &admission, &mut in_flight).await {
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// One proposal round. Returns false once the admission queue is gone.
async fn propose_once(
    container: &NodeContainer,
    proposer: &Proposer,
    admission: &AdmissionHandle,
    in_flight: &mut HashSet<DeployHash>,
) -> bool {
    let pool = &container.deploy_pool;
    in_flight.retain(|hash| pool.contains(hash));
    let deploys: Vec<Deploy> = pool
        .pending(usize::MAX)
        .into_iter()
        .filter(|deploy| !in_flight.contains(&deploy.hash))
        .take(container.config.proposer.max_deploys)
        .collect();

    let snapshot = container.store.snapshot();
    let block = match proposer
        .propose(&snapshot, deploys, SystemTimeSource.now_millis())
        .await
    {
        Ok(block) => block,
        Err(e) => {
            warn!(error = %e, "Proposal failed");
            return true;
        }
    };

    let hash = block.hash;
    let included: Vec<DeployHash> = block.deploys.iter().map(|d| d.hash).collect();
    match admission.submit(block).await {
        Ok(AdmissionOutcome::Admitted(admitted)) => {
            in_flight.extend(included);
            info!(
                block = %short_hex(&hash),
                height = admitted.height,
                "Own block admitted"
            );
            true
        }
        Ok(outcome) => {
            warn!(block = %short_hex(&hash), outcome = outcome.label(), "Own block not admitted");
            true
        }
        Err(_) => false,
    }
}
