//! Pipeline outcomes.

use std::collections::BTreeSet;

use cc_01_block_dag::EquivocationEvidence;
use shared_types::{BlockHash, ValidatorId};

use super::error::RejectReason;

/// Non-fatal findings attached to an admitted block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationAdvisory {
    /// Declared parents differ from what fork choice would select.
    ParentsDivergeFromForkChoice {
        declared: Vec<BlockHash>,
        expected: Vec<BlockHash>,
    },
}

/// How a competing block of an equivocation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquivocationClass {
    /// Cited by a non-equivocating validator; it must stay in the DAG.
    Admissible,
    /// Nobody honest builds on it.
    Ignorable,
}

/// Classification of one competing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEquivocation {
    pub validator: ValidatorId,
    pub seq_num: u64,
    pub block: BlockHash,
    pub class: EquivocationClass,
}

/// A block that passed every stage and is now in the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedBlock {
    pub hash: BlockHash,
    pub height: u64,
    /// Set when this block itself reused a `(sender, seq_num)` pair.
    pub direct_equivocation: Option<EquivocationEvidence>,
    /// Competing blocks this admission touched, with their classification.
    pub equivocations: Vec<ClassifiedEquivocation>,
    pub advisories: Vec<ValidationAdvisory>,
}

/// Result of [`crate::ValidationPipeline::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Admitted(AdmittedBlock),
    /// Dependencies are missing; retry once they are admitted.
    Pending(BTreeSet<BlockHash>),
    Rejected(RejectReason),
}

impl AdmissionOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AdmissionOutcome::Pending(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AdmissionOutcome::Rejected(_))
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AdmissionOutcome::Admitted(_) => "admitted",
            AdmissionOutcome::Pending(_) => "pending",
            AdmissionOutcome::Rejected(_) => "rejected",
        }
    }
}

/// Why the read-only stages stopped before state execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    Pending(BTreeSet<BlockHash>),
    Rejected(RejectReason),
}

impl From<Halt> for AdmissionOutcome {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::Pending(missing) => AdmissionOutcome::Pending(missing),
            Halt::Rejected(reason) => AdmissionOutcome::Rejected(reason),
        }
    }
}

impl Halt {
    pub fn reject(reason: impl Into<RejectReason>) -> Self {
        Halt::Rejected(reason.into())
    }
}

/// Output of the read-only stages 1 to 4.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreValidated {
    /// Stored blocks sharing the candidate's `(sender, seq_num)`.
    pub same_sequence: Vec<BlockHash>,
    pub advisories: Vec<ValidationAdvisory>,
}
