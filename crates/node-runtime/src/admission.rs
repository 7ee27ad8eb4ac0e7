//! # Admission Queue
//!
//! Single task that owns every write to the DAG coming from outside the
//! finalization loop. Blocks whose dependencies are missing are parked,
//! keyed by the hashes they wait on, and re-admitted in arrival order once
//! the last of them is admitted.
//!
//! ```text
//!  submit(block) ──mpsc──→ [queue task] ──→ BlockAdmission::admit
//!        ↑                      │                  │
//!        └──── oneshot ─────────┘      Pending ────┴──→ park + request
//!                                      Admitted ───────→ release dependants
//! ```

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use cc_01_block_dag::DagStore;
use cc_03_validation::{AdmissionOutcome, BlockAdmission, ConsensusViolation, RejectReason};
use shared_types::{short_hex, Block, BlockHash};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Admission queue limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Maximum parked blocks; the oldest is evicted beyond this.
    pub max_pending: usize,
    /// Buffer of the submission channel.
    pub channel_capacity: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_pending: 10_000,
            channel_capacity: 1_024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Admission queue has stopped")]
    Closed,
}

/// Asks the network for blocks the DAG is missing.
#[async_trait]
pub trait BlockRequester: Send + Sync {
    async fn request_blocks(&self, missing: &BTreeSet<BlockHash>);
}

/// Requester for nodes without a network layer: logs and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRequester;

#[async_trait]
impl BlockRequester for LoggingRequester {
    async fn request_blocks(&self, missing: &BTreeSet<BlockHash>) {
        debug!(count = missing.len(), "Missing dependencies requested");
    }
}

enum Command {
    Submit {
        block: Block,
        reply: oneshot::Sender<AdmissionOutcome>,
    },
    PendingCount {
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable front of the admission queue.
#[derive(Clone)]
pub struct AdmissionHandle {
    commands: mpsc::Sender<Command>,
}

impl AdmissionHandle {
    /// Validate and admit `block`. Dependants it unblocks are re-admitted
    /// before this returns.
    pub async fn submit(&self, block: Block) -> Result<AdmissionOutcome, AdmissionError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Submit { block, reply })
            .await
            .map_err(|_| AdmissionError::Closed)?;
        outcome.await.map_err(|_| AdmissionError::Closed)
    }

    /// Number of parked blocks.
    pub async fn pending_count(&self) -> Result<usize, AdmissionError> {
        let (reply, count) = oneshot::channel();
        self.commands
            .send(Command::PendingCount { reply })
            .await
            .map_err(|_| AdmissionError::Closed)?;
        count.await.map_err(|_| AdmissionError::Closed)
    }
}

/// The queue task. Stops when every [`AdmissionHandle`] is dropped.
pub struct AdmissionQueue<A> {
    admission: Arc<A>,
    store: Arc<DagStore>,
    requester: Arc<dyn BlockRequester>,
    pending: PendingBuffer,
}

impl<A> AdmissionQueue<A>
where
    A: BlockAdmission + 'static,
{
    pub fn spawn(
        admission: Arc<A>,
        store: Arc<DagStore>,
        requester: Arc<dyn BlockRequester>,
        config: AdmissionConfig,
    ) -> AdmissionHandle {
        let (commands, receiver) = mpsc::channel(config.channel_capacity.max(1));
        let queue = Self {
            admission,
            store,
            requester,
            pending: PendingBuffer::new(config.max_pending),
        };
        tokio::spawn(queue.run(receiver));
        AdmissionHandle { commands }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Submit { block, reply } => {
                    let outcome = self.process(block).await;
                    // The submitter may have given up waiting.
                    let _ = reply.send(outcome);
                }
                Command::PendingCount { reply } => {
                    let _ = reply.send(self.pending.len());
                }
            }
        }
        debug!(parked = self.pending.len(), "Admission queue stopped");
    }

    async fn process(&mut self, block: Block) -> AdmissionOutcome {
        let first = self.admit_one(block).await;

        let released = match &first {
            AdmissionOutcome::Admitted(admitted) => Some(admitted.hash),
            AdmissionOutcome::Rejected(RejectReason::Consensus(
                ConsensusViolation::AlreadyAdmitted(hash),
            )) => Some(*hash),
            _ => None,
        };
        if let Some(hash) = released {
            let mut ready: VecDeque<Block> = self.pending.release(&hash).into();
            while let Some(next) = ready.pop_front() {
                let next_hash = next.hash;
                match self.admit_one(next).await {
                    AdmissionOutcome::Admitted(_) => ready.extend(self.pending.release(&next_hash)),
                    AdmissionOutcome::Rejected(reason) => {
                        warn!(block = %short_hex(&next_hash), %reason, "Parked block rejected on re-admission");
                    }
                    AdmissionOutcome::Pending(_) => {}
                }
            }
        }

        self.publish_gauges();
        first
    }

    async fn admit_one(&mut self, block: Block) -> AdmissionOutcome {
        let candidate = block.clone();
        let outcome = self.admission.admit(block, &self.store).await;
        if let AdmissionOutcome::Pending(missing) = &outcome {
            let hash = candidate.hash;
            if let Some(evicted) = self.pending.park(candidate, missing.clone()) {
                warn!(
                    evicted = %short_hex(&evicted),
                    capacity = self.pending.capacity,
                    "Pending buffer full, oldest parked block evicted"
                );
                casper_telemetry::ADMISSION_EVICTED.inc();
            }
            info!(block = %short_hex(&hash), missing = missing.len(), "Block parked");
            self.requester.request_blocks(missing).await;
        }
        outcome
    }

    fn publish_gauges(&self) {
        let dag = self.store.snapshot();
        casper_telemetry::ADMISSION_PENDING.set(self.pending.len() as i64);
        casper_telemetry::DAG_BLOCKS.set(dag.len() as i64);
        casper_telemetry::DAG_MAX_HEIGHT.set(dag.max_height() as i64);
    }
}

// =============================================================================
// PENDING BUFFER
// =============================================================================

struct Parked {
    block: Block,
    missing: BTreeSet<BlockHash>,
}

/// Parked blocks indexed by the dependencies they wait on.
struct PendingBuffer {
    capacity: usize,
    parked: HashMap<BlockHash, Parked>,
    waiting_on: HashMap<BlockHash, Vec<BlockHash>>,
    // Oldest first; drives eviction and re-admission order.
    arrival: VecDeque<BlockHash>,
}

impl PendingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            parked: HashMap::new(),
            waiting_on: HashMap::new(),
            arrival: VecDeque::new(),
        }
    }

    fn len(&self) -> usize {
        self.parked.len()
    }

    /// Park `block` until `missing` is admitted. Returns the evicted block,
    /// if the buffer was full. Parking the same block twice is a no-op.
    fn park(&mut self, block: Block, missing: BTreeSet<BlockHash>) -> Option<BlockHash> {
        let hash = block.hash;
        if self.parked.contains_key(&hash) {
            return None;
        }
        let evicted = if self.parked.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };
        for dependency in &missing {
            self.waiting_on.entry(*dependency).or_default().push(hash);
        }
        self.parked.insert(hash, Parked { block, missing });
        self.arrival.push_back(hash);
        evicted
    }

    /// Blocks whose last missing dependency was `admitted`, oldest first.
    fn release(&mut self, admitted: &BlockHash) -> Vec<Block> {
        let Some(dependants) = self.waiting_on.remove(admitted) else {
            return Vec::new();
        };
        let mut ready = HashSet::new();
        for hash in dependants {
            if let Some(parked) = self.parked.get_mut(&hash) {
                parked.missing.remove(admitted);
                if parked.missing.is_empty() {
                    ready.insert(hash);
                }
            }
        }
        if ready.is_empty() {
            return Vec::new();
        }

        let order: Vec<BlockHash> = self
            .arrival
            .iter()
            .filter(|hash| ready.contains(*hash))
            .copied()
            .collect();
        self.arrival.retain(|hash| !ready.contains(hash));
        order
            .into_iter()
            .filter_map(|hash| self.parked.remove(&hash).map(|parked| parked.block))
            .collect()
    }

    fn evict_oldest(&mut self) -> Option<BlockHash> {
        while let Some(hash) = self.arrival.pop_front() {
            if let Some(parked) = self.parked.remove(&hash) {
                for dependency in &parked.missing {
                    if let Some(waiters) = self.waiting_on.get_mut(dependency) {
                        waiters.retain(|waiter| *waiter != hash);
                        if waiters.is_empty() {
                            self.waiting_on.remove(dependency);
                        }
                    }
                }
                return Some(hash);
            }
        }
        None
    }
}
