//! Block Validation Rules - Pure Domain Logic
//!
//! Format, cryptographic and consensus checks. No I/O, no async: each rule
//! reads the candidate and, where needed, a DAG snapshot.

use std::collections::HashSet;

use cc_01_block_dag::BlockDag;
use shared_types::{Block, BlockHash};

use super::config::{ValidationConfig, SIGNATURE_LEN};
use super::error::{ConsensusViolation, CryptoViolation, FormatViolation};
use super::outcome::ValidationAdvisory;
use crate::ports::CryptoProvider;

/// Stage 1: structural limits and timestamp drift.
pub fn check_format(
    block: &Block,
    config: &ValidationConfig,
    now_millis: u64,
) -> Result<(), FormatViolation> {
    let parents = block.parent_hashes.len();
    if parents == 0 {
        return Err(FormatViolation::NoParents);
    }
    if parents > config.max_parents {
        return Err(FormatViolation::TooManyParents {
            count: parents,
            limit: config.max_parents,
        });
    }
    let mut seen = HashSet::with_capacity(parents);
    for parent in &block.parent_hashes {
        if !seen.insert(parent) {
            return Err(FormatViolation::DuplicateParent(*parent));
        }
    }

    if block.signature.len() != SIGNATURE_LEN {
        return Err(FormatViolation::SignatureLength {
            expected: SIGNATURE_LEN,
            actual: block.signature.len(),
        });
    }

    if block.deploys.len() > config.max_deploys {
        return Err(FormatViolation::TooManyDeploys {
            count: block.deploys.len(),
            limit: config.max_deploys,
        });
    }
    let mut deploy_hashes = HashSet::with_capacity(block.deploys.len());
    for deploy in &block.deploys {
        if !deploy_hashes.insert(deploy.hash) {
            return Err(FormatViolation::DuplicateDeploy(deploy.hash));
        }
    }

    let size = block.encoded_len();
    if size > config.max_block_bytes {
        return Err(FormatViolation::BlockTooLarge {
            size,
            limit: config.max_block_bytes,
        });
    }

    if block.timestamp > now_millis.saturating_add(config.max_clock_drift_ms) {
        return Err(FormatViolation::FutureTimestamp {
            timestamp: block.timestamp,
            current: now_millis,
        });
    }
    Ok(())
}

/// Stage 2: content hash and signature.
pub fn check_crypto<C: CryptoProvider + ?Sized>(
    block: &Block,
    crypto: &C,
) -> Result<(), CryptoViolation> {
    let computed = crypto.hash(&block.content_bytes());
    if computed != block.hash {
        return Err(CryptoViolation::HashMismatch {
            declared: block.hash,
            computed,
        });
    }
    if !crypto.verify(&block.sender, &block.hash, &block.signature) {
        return Err(CryptoViolation::InvalidSignature(block.sender));
    }
    Ok(())
}

/// Stage 3: sequence numbering and creator justification.
///
/// Returns the stored blocks that share the candidate's `(sender, seq_num)`;
/// a non-empty result means the candidate is a direct equivocation. When the
/// creator justification names a block the DAG does not hold yet, the
/// sequence checks wait for the dependency stage to park the block.
pub fn check_sequence(block: &Block, dag: &BlockDag) -> Result<Vec<BlockHash>, ConsensusViolation> {
    let validator = block.sender;
    let seq_num = block.seq_num;
    let invalid = ConsensusViolation::InvalidCreatorJustification { validator, seq_num };

    let Some(previous) = block.creator_justification() else {
        return Err(invalid);
    };
    let same_sequence = dag.blocks_at(&validator, seq_num);
    if !dag.contains(previous) {
        return Ok(same_sequence);
    }

    if seq_num == 0 {
        if previous != dag.genesis() {
            return Err(invalid);
        }
    } else {
        let predecessors = dag.blocks_at(&validator, seq_num - 1);
        if predecessors.is_empty() {
            return Err(ConsensusViolation::SkippedSequenceNumber { validator, seq_num });
        }
        if !predecessors.contains(previous) {
            return Err(invalid);
        }
    }
    Ok(same_sequence)
}

/// Stage 3: every known justification target is authored by the validator
/// it is filed under. Genesis stands in for "nothing seen yet".
pub fn check_justification_senders(
    block: &Block,
    dag: &BlockDag,
) -> Result<(), ConsensusViolation> {
    for (validator, target) in &block.justifications {
        if target == dag.genesis() {
            continue;
        }
        if let Some(justified) = dag.get(target) {
            if justified.sender != *validator {
                return Err(ConsensusViolation::JustificationSenderMismatch {
                    validator: *validator,
                });
            }
        }
    }
    Ok(())
}

/// Stage 3 cross-check: declared parents against fork choice, as sets.
pub fn check_parents(block: &Block, expected: &[BlockHash]) -> Option<ValidationAdvisory> {
    let declared: HashSet<_> = block.parent_hashes.iter().collect();
    let wanted: HashSet<_> = expected.iter().collect();
    (declared != wanted).then(|| ValidationAdvisory::ParentsDivergeFromForkChoice {
        declared: block.parent_hashes.clone(),
        expected: expected.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_01_block_dag::test_utils::{validator, DagBuilder};
    use shared_types::Deploy;

    fn builder() -> DagBuilder {
        DagBuilder::new(&[(validator(1), 10), (validator(2), 10)])
    }

    fn formatted(mut block: Block) -> Block {
        block.signature = vec![0u8; SIGNATURE_LEN];
        block
    }

    #[test]
    fn test_format_accepts_well_formed_block() {
        let mut b = builder();
        let g = b.genesis();
        let block = formatted(b.make_block(validator(1), 0, &[g], &[]));
        assert_eq!(
            check_format(&block, &ValidationConfig::default(), block.timestamp),
            Ok(())
        );
    }

    #[test]
    fn test_format_rejects_parent_problems() {
        let mut b = builder();
        let g = b.genesis();
        let config = ValidationConfig {
            max_parents: 2,
            ..ValidationConfig::default()
        };

        let mut block = formatted(b.make_block(validator(1), 0, &[g], &[]));
        block.parent_hashes.clear();
        assert_eq!(check_format(&block, &config, 0), Err(FormatViolation::NoParents));

        block.parent_hashes = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        assert_eq!(
            check_format(&block, &config, u64::MAX),
            Err(FormatViolation::TooManyParents { count: 3, limit: 2 })
        );

        block.parent_hashes = vec![g, g];
        assert_eq!(
            check_format(&block, &config, u64::MAX),
            Err(FormatViolation::DuplicateParent(g))
        );
    }

    #[test]
    fn test_format_rejects_bad_signature_length() {
        let mut b = builder();
        let g = b.genesis();
        let mut block = formatted(b.make_block(validator(1), 0, &[g], &[]));
        block.signature.truncate(10);

        assert_eq!(
            check_format(&block, &ValidationConfig::default(), u64::MAX),
            Err(FormatViolation::SignatureLength {
                expected: 64,
                actual: 10
            })
        );
    }

    #[test]
    fn test_format_rejects_deploy_problems() {
        let mut b = builder();
        let g = b.genesis();
        let mut block = formatted(b.make_block(validator(1), 0, &[g], &[]));
        let deploy = Deploy {
            hash: [7u8; 32],
            payload: vec![1, 2, 3],
        };
        block.deploys = vec![deploy.clone(), deploy];

        assert_eq!(
            check_format(&block, &ValidationConfig::default(), u64::MAX),
            Err(FormatViolation::DuplicateDeploy([7u8; 32]))
        );

        let config = ValidationConfig {
            max_deploys: 1,
            ..ValidationConfig::default()
        };
        assert_eq!(
            check_format(&block, &config, u64::MAX),
            Err(FormatViolation::TooManyDeploys { count: 2, limit: 1 })
        );
    }

    #[test]
    fn test_format_rejects_oversized_block() {
        let mut b = builder();
        let g = b.genesis();
        let mut block = formatted(b.make_block(validator(1), 0, &[g], &[]));
        block.deploys = vec![Deploy {
            hash: [7u8; 32],
            payload: vec![0u8; 2048],
        }];
        let config = ValidationConfig {
            max_block_bytes: 1024,
            ..ValidationConfig::default()
        };

        assert!(matches!(
            check_format(&block, &config, u64::MAX),
            Err(FormatViolation::BlockTooLarge { limit: 1024, .. })
        ));
    }

    #[test]
    fn test_format_future_timestamp_drift() {
        let mut b = builder();
        let g = b.genesis();
        let mut block = formatted(b.make_block(validator(1), 0, &[g], &[]));
        let config = ValidationConfig::default();
        block.timestamp = 100_000;

        assert_eq!(check_format(&block, &config, 100_000 - 15_000), Ok(()));
        assert_eq!(
            check_format(&block, &config, 100_000 - 15_001),
            Err(FormatViolation::FutureTimestamp {
                timestamp: 100_000,
                current: 84_999
            })
        );
    }

    #[test]
    fn test_sequence_first_block_must_justify_genesis() {
        let mut b = builder();
        let g = b.genesis();
        let a1 = b.block(validator(1), &[g]);

        let ok = b.make_block(validator(2), 0, &[g], &[]);
        assert_eq!(check_sequence(&ok, b.dag()), Ok(vec![]));

        let mut bad = b.make_block(validator(2), 0, &[g], &[]);
        bad.justifications.insert(validator(2), a1);
        assert_eq!(
            check_sequence(&bad, b.dag()),
            Err(ConsensusViolation::InvalidCreatorJustification {
                validator: validator(2),
                seq_num: 0
            })
        );
    }

    #[test]
    fn test_sequence_skip_rejected() {
        let mut b = builder();
        let g = b.genesis();
        let a0 = b.block(validator(1), &[g]);
        b.block(validator(1), &[a0]);

        let mut skipped = b.make_block(validator(1), 5, &[a0], &[]);
        skipped.justifications.insert(validator(1), a0);
        assert_eq!(
            check_sequence(&skipped, b.dag()),
            Err(ConsensusViolation::SkippedSequenceNumber {
                validator: validator(1),
                seq_num: 5
            })
        );
    }

    #[test]
    fn test_sequence_wrong_predecessor_rejected() {
        let mut b = builder();
        let g = b.genesis();
        let a0 = b.block(validator(1), &[g]);
        let a1 = b.block(validator(1), &[a0]);

        let mut block = b.make_block(validator(1), 2, &[a1], &[]);
        block.justifications.insert(validator(1), a0);
        assert_eq!(
            check_sequence(&block, b.dag()),
            Err(ConsensusViolation::InvalidCreatorJustification {
                validator: validator(1),
                seq_num: 2
            })
        );
    }

    #[test]
    fn test_sequence_missing_creator_justification_rejected() {
        let mut b = builder();
        let g = b.genesis();
        let mut block = b.make_block(validator(1), 0, &[g], &[]);
        block.justifications.clear();
        assert!(check_sequence(&block, b.dag()).is_err());
    }

    #[test]
    fn test_sequence_unknown_predecessor_deferred() {
        let mut b = builder();
        let g = b.genesis();
        let mut block = b.make_block(validator(1), 3, &[g], &[]);
        block.justifications.insert(validator(1), [0xCC; 32]);
        assert_eq!(check_sequence(&block, b.dag()), Ok(vec![]));
    }

    #[test]
    fn test_sequence_reports_same_sequence_blocks() {
        let mut b = builder();
        let g = b.genesis();
        let a0 = b.block(validator(1), &[g]);
        let twin = b.make_block(validator(1), 0, &[g], &[]);
        assert_eq!(check_sequence(&twin, b.dag()), Ok(vec![a0]));
    }

    #[test]
    fn test_justification_sender_mismatch() {
        let mut b = builder();
        let g = b.genesis();
        let a0 = b.block(validator(1), &[g]);
        let mut block = b.make_block(validator(2), 0, &[a0], &[]);
        assert_eq!(check_justification_senders(&block, b.dag()), Ok(()));

        block.justifications.insert(validator(1), g);
        assert_eq!(check_justification_senders(&block, b.dag()), Ok(()));

        block.justifications.insert(validator(1), a0);
        block.justifications.insert(validator(2), a0);
        assert_eq!(
            check_justification_senders(&block, b.dag()),
            Err(ConsensusViolation::JustificationSenderMismatch {
                validator: validator(2)
            })
        );
    }

    #[test]
    fn test_parent_divergence_is_set_based() {
        let mut b = builder();
        let g = b.genesis();
        let block = b.make_block(validator(1), 0, &[g, [1u8; 32]], &[]);

        assert_eq!(check_parents(&block, &[[1u8; 32], g]), None);
        assert!(check_parents(&block, &[g]).is_some());
    }
}
