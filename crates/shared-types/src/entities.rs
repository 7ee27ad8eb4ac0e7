//! # Core Domain Entities
//!
//! Defines the entities every consensus subsystem agrees on.
//!
//! ## Clusters
//!
//! - **Identity**: `ValidatorId`, `Stake`, `Bond`
//! - **Chain**: `Block`, `Deploy`, and the hash aliases that identify them

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::errors::TypeError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte hash (BLAKE3).
pub type Hash = [u8; 32];

/// Content hash identifying a block.
pub type BlockHash = Hash;

/// Opaque post-execution state identifier owned by the execution engine.
pub type StateHash = Hash;

/// Content hash identifying a deploy.
pub type DeployHash = Hash;

/// Bonded stake of a validator.
pub type Stake = u64;

/// Length of a compressed secp256k1 public key.
pub const VALIDATOR_ID_LEN: usize = 33;

/// A validator identity: its compressed secp256k1 public key.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorId(#[serde_as(as = "Bytes")] pub [u8; VALIDATOR_ID_LEN]);

impl ValidatorId {
    /// Sender recorded on the genesis block. Never a real key.
    pub const GENESIS: ValidatorId = ValidatorId([0u8; VALIDATOR_ID_LEN]);

    /// Raw compressed key bytes.
    pub fn as_bytes(&self) -> &[u8; VALIDATOR_ID_LEN] {
        &self.0
    }

    /// Parse from a 66-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let raw = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let bytes: [u8; VALIDATOR_ID_LEN] =
            raw.as_slice()
                .try_into()
                .map_err(|_| TypeError::InvalidLength {
                    expected: VALIDATOR_ID_LEN,
                    actual: raw.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Full hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorId({})", short_hex(&self.0))
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_hex(&self.0))
    }
}

/// A validator's stake as recorded in a block's bonds table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// The bonded validator.
    pub validator: ValidatorId,
    /// Amount at stake.
    pub stake: Stake,
}

/// First eight hex characters of a byte string, for log fields.
pub fn short_hex(bytes: &[u8]) -> String {
    let take = bytes.len().min(4);
    hex::encode(&bytes[..take])
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// An opaque unit of work carried by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deploy {
    /// Content hash of the deploy.
    pub hash: DeployHash,
    /// Payload interpreted only by the execution engine.
    pub payload: Vec<u8>,
}

/// A block in the consensus DAG.
///
/// Immutable once constructed; its identity is `hash`, computed over
/// [`Block::content_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Content hash.
    pub hash: BlockHash,
    /// Creator of the block.
    pub sender: ValidatorId,
    /// Per-sender sequence number, starting at 0.
    pub seq_num: u64,
    /// Parents in the creator's fork-choice order. Empty only for genesis.
    pub parent_hashes: Vec<BlockHash>,
    /// Latest block the creator had seen from each validator.
    pub justifications: BTreeMap<ValidatorId, BlockHash>,
    /// Creation time, unix milliseconds.
    pub timestamp: u64,
    /// State the deploys were executed against.
    pub pre_state_hash: StateHash,
    /// State after executing the deploys.
    pub post_state_hash: StateHash,
    /// Deploys carried by this block.
    pub deploys: Vec<Deploy>,
    /// Bonds table as of this block's post-state.
    pub bonds: BTreeMap<ValidatorId, Stake>,
    /// Creator's signature over `hash`.
    pub signature: Vec<u8>,
}

impl Block {
    /// True for the root of the DAG.
    pub fn is_genesis(&self) -> bool {
        self.parent_hashes.is_empty()
    }

    /// Justification the creator gave for its own previous block.
    pub fn creator_justification(&self) -> Option<&BlockHash> {
        self.justifications.get(&self.sender)
    }

    /// Every hash this block refers to: parents then justification targets.
    pub fn dependencies(&self) -> impl Iterator<Item = &BlockHash> {
        self.parent_hashes
            .iter()
            .chain(self.justifications.values())
    }

    /// Deterministic encoding of every field except `hash` and `signature`.
    ///
    /// Integers are big-endian; collections are length-prefixed with a `u32`.
    pub fn content_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256 + self.encoded_deploy_len());
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(&self.seq_num.to_be_bytes());

        put_len(&mut out, self.parent_hashes.len());
        for parent in &self.parent_hashes {
            out.extend_from_slice(parent);
        }

        put_len(&mut out, self.justifications.len());
        for (validator, target) in &self.justifications {
            out.extend_from_slice(validator.as_bytes());
            out.extend_from_slice(target);
        }

        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.pre_state_hash);
        out.extend_from_slice(&self.post_state_hash);

        put_len(&mut out, self.deploys.len());
        for deploy in &self.deploys {
            out.extend_from_slice(&deploy.hash);
            put_len(&mut out, deploy.payload.len());
            out.extend_from_slice(&deploy.payload);
        }

        put_len(&mut out, self.bonds.len());
        for (validator, stake) in &self.bonds {
            out.extend_from_slice(validator.as_bytes());
            out.extend_from_slice(&stake.to_be_bytes());
        }
        out
    }

    /// Approximate wire size: content plus hash and signature.
    pub fn encoded_len(&self) -> usize {
        self.content_bytes().len() + self.hash.len() + self.signature.len()
    }

    fn encoded_deploy_len(&self) -> usize {
        self.deploys.iter().map(|d| 36 + d.payload.len()).sum()
    }
}

fn put_len(out: &mut Vec<u8>, len: usize) {
    // Collections beyond u32::MAX never pass format validation.
    out.extend_from_slice(&(len.min(u32::MAX as usize) as u32).to_be_bytes());
}
