//! Rejection taxonomy for the validation pipeline.
//!
//! Every terminal failure belongs to exactly one category. Missing
//! dependencies are not an error: they produce a `Pending` outcome.

use shared_types::{short_hex, BlockHash, DeployHash, ValidatorId};
use thiserror::Error;

/// Structural problems detectable from the block alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatViolation {
    #[error("Block has no parents")]
    NoParents,

    #[error("Too many parents: {count} > {limit}")]
    TooManyParents { count: usize, limit: usize },

    #[error("Parent listed twice: {}", short_hex(.0))]
    DuplicateParent(BlockHash),

    #[error("Signature must be {expected} bytes, got {actual}")]
    SignatureLength { expected: usize, actual: usize },

    #[error("Too many deploys: {count} > {limit}")]
    TooManyDeploys { count: usize, limit: usize },

    #[error("Deploy included twice: {}", short_hex(.0))]
    DuplicateDeploy(DeployHash),

    #[error("Block too large: {size} bytes > {limit} bytes")]
    BlockTooLarge { size: usize, limit: usize },

    #[error("Timestamp too far in future: {timestamp}, current is {current}")]
    FutureTimestamp { timestamp: u64, current: u64 },
}

/// Hash or signature does not check out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoViolation {
    #[error("Content hash mismatch: declared {}, computed {}", short_hex(.declared), short_hex(.computed))]
    HashMismatch {
        declared: BlockHash,
        computed: BlockHash,
    },

    #[error("Invalid block signature from {0}")]
    InvalidSignature(ValidatorId),
}

/// Protocol rules relating the block to the DAG.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusViolation {
    #[error("Block already admitted: {}", short_hex(.0))]
    AlreadyAdmitted(BlockHash),

    #[error("Validator {validator} skipped to sequence number {seq_num}")]
    SkippedSequenceNumber { validator: ValidatorId, seq_num: u64 },

    #[error("Creator justification of {validator} at seq {seq_num} does not name its previous block")]
    InvalidCreatorJustification { validator: ValidatorId, seq_num: u64 },

    #[error("Justification for {validator} points at a block from another validator")]
    JustificationSenderMismatch { validator: ValidatorId },

    #[error("DAG refused block: {0}")]
    DagRefused(String),
}

/// Pre- or post-state does not match execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTransitionViolation {
    #[error("Pre-state hash does not match merged parent states")]
    InvalidPreStateHash,

    #[error("Post-state hash does not match execution result")]
    InvalidPostStateHash,

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Misbehaviour evident from what the block claims to have seen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ByzantineViolation {
    #[error("Block saw equivocation by {validator} but does not justify it")]
    NeglectedEquivocation { validator: ValidatorId },
}

/// Coarse grouping used for metrics and peer policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCategory {
    Format,
    Crypto,
    Consensus,
    StateTransition,
    Byzantine,
}

impl RejectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectCategory::Format => "format",
            RejectCategory::Crypto => "crypto",
            RejectCategory::Consensus => "consensus",
            RejectCategory::StateTransition => "state_transition",
            RejectCategory::Byzantine => "byzantine",
        }
    }
}

/// Why a block was rejected. Terminal: resubmitting the same block yields
/// the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error(transparent)]
    Format(#[from] FormatViolation),

    #[error(transparent)]
    Crypto(#[from] CryptoViolation),

    #[error(transparent)]
    Consensus(#[from] ConsensusViolation),

    #[error(transparent)]
    StateTransition(#[from] StateTransitionViolation),

    #[error(transparent)]
    Byzantine(#[from] ByzantineViolation),
}

impl RejectReason {
    pub fn category(&self) -> RejectCategory {
        match self {
            RejectReason::Format(_) => RejectCategory::Format,
            RejectReason::Crypto(_) => RejectCategory::Crypto,
            RejectReason::Consensus(_) => RejectCategory::Consensus,
            RejectReason::StateTransition(_) => RejectCategory::StateTransition,
            RejectReason::Byzantine(_) => RejectCategory::Byzantine,
        }
    }

    /// True when the sender provably misbehaved, as opposed to relaying a
    /// stale or malformed block.
    pub fn is_reputation_relevant(&self) -> bool {
        matches!(
            self.category(),
            RejectCategory::Crypto | RejectCategory::StateTransition | RejectCategory::Byzantine
        )
    }
}
