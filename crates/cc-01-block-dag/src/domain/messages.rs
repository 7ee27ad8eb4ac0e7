//! Latest-message view and equivocation evidence.

use shared_types::{BlockHash, ValidatorId};

/// The newest block(s) the DAG holds from one validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestMessage {
    /// A single chain tip.
    Single(BlockHash),
    /// Several competing tips; the validator has equivocated. Sorted by hash.
    Equivocated(Vec<BlockHash>),
}

impl LatestMessage {
    /// Every tip, in ascending hash order.
    pub fn hashes(&self) -> &[BlockHash] {
        match self {
            LatestMessage::Single(hash) => std::slice::from_ref(hash),
            LatestMessage::Equivocated(hashes) => hashes,
        }
    }

    pub fn is_equivocated(&self) -> bool {
        matches!(self, LatestMessage::Equivocated(_))
    }

    /// Canonical tip: the only one, or the smallest hash among several.
    pub fn canonical(&self) -> &BlockHash {
        &self.hashes()[0]
    }

    pub(crate) fn from_sorted(mut hashes: Vec<BlockHash>) -> Option<Self> {
        match hashes.len() {
            0 => None,
            1 => hashes.pop().map(LatestMessage::Single),
            _ => Some(LatestMessage::Equivocated(hashes)),
        }
    }
}

/// Two or more blocks from one validator at the same sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivocationEvidence {
    /// The equivocating validator.
    pub validator: ValidatorId,
    /// Sequence number used more than once.
    pub seq_num: u64,
    /// Every block seen at that sequence number, sorted by hash.
    pub competing: Vec<BlockHash>,
}

/// Result of a successful insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Hash of the inserted block.
    pub hash: BlockHash,
    /// Height assigned to the block.
    pub height: u64,
    /// Set when the block shares `(sender, seq_num)` with a stored block.
    pub equivocation: Option<EquivocationEvidence>,
}

/// Ancestor set produced by a bounded walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestry {
    /// Visited hashes, including the start block.
    pub hashes: std::collections::HashSet<BlockHash>,
    /// True when the depth cap stopped the walk early.
    pub truncated: bool,
}
