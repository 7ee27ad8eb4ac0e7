//! Equivocation checks over the candidate's justification closure.
//!
//! The closure is every block reachable from the candidate through
//! justification edges. A block whose closure holds two competing blocks of
//! one validator has seen that validator equivocate, and must then say so by
//! justifying one of that validator's blocks itself. The walk does not
//! descend past blocks below the last finalized height.

use std::collections::{BTreeSet, HashSet, VecDeque};

use cc_01_block_dag::{BlockDag, EquivocationEvidence};
use shared_types::{short_hex, Block, BlockHash, ValidatorId};
use tracing::warn;

use super::error::ByzantineViolation;
use super::outcome::{ClassifiedEquivocation, EquivocationClass};

/// Blocks reachable through justifications, and which of them a
/// non-equivocating validator has cited.
#[derive(Debug, Default)]
struct JustificationClosure {
    seen: HashSet<BlockHash>,
    honestly_cited: HashSet<BlockHash>,
    truncated: bool,
}

fn justification_closure(
    block: &Block,
    dag: &BlockDag,
    equivocators: &BTreeSet<ValidatorId>,
    max_depth: usize,
) -> JustificationClosure {
    let mut closure = JustificationClosure::default();
    let floor = dag.height(dag.last_finalized()).unwrap_or(0);
    let candidate_honest = !equivocators.contains(&block.sender);

    let mut queue = VecDeque::new();
    for target in block.justifications.values() {
        if candidate_honest {
            closure.honestly_cited.insert(*target);
        }
        if closure.seen.insert(*target) {
            queue.push_back((*target, 1usize));
        }
    }

    while let Some((current, depth)) = queue.pop_front() {
        let Some(justified) = dag.get(&current) else {
            continue;
        };
        // Blocks below the last finalized height are recorded, not expanded.
        if dag.height(&current).is_some_and(|height| height < floor) {
            continue;
        }
        let honest = !equivocators.contains(&justified.sender);
        for target in justified.justifications.values() {
            if honest {
                closure.honestly_cited.insert(*target);
            }
            if closure.seen.contains(target) {
                continue;
            }
            if depth >= max_depth {
                closure.truncated = true;
                continue;
            }
            closure.seen.insert(*target);
            queue.push_back((*target, depth + 1));
        }
    }

    if closure.truncated {
        warn!(
            block = %short_hex(&block.hash),
            max_depth,
            visited = closure.seen.len(),
            "Justification walk truncated at depth cap"
        );
    }
    closure
}

/// Stage 6: reject neglected equivocations and classify every competing
/// block this admission touches.
///
/// `direct` carries the equivocation the candidate itself creates, if any;
/// its sender is treated as an equivocator for the whole check. Output is
/// ordered by validator, sequence number and block hash.
pub fn check_equivocations(
    block: &Block,
    dag: &BlockDag,
    direct: Option<&EquivocationEvidence>,
    max_depth: usize,
) -> Result<Vec<ClassifiedEquivocation>, ByzantineViolation> {
    let mut equivocators: BTreeSet<ValidatorId> = dag.equivocators().copied().collect();
    if let Some(evidence) = direct {
        equivocators.insert(evidence.validator);
    }
    if equivocators.is_empty() {
        return Ok(Vec::new());
    }

    let closure = justification_closure(block, dag, &equivocators, max_depth);
    let mut classified = Vec::new();

    for validator in &equivocators {
        let mut evidence = dag.equivocations_of(validator);
        if let Some(direct) = direct.filter(|d| d.validator == *validator) {
            match evidence.iter_mut().find(|e| e.seq_num == direct.seq_num) {
                Some(existing) => {
                    let merged: BTreeSet<_> = existing
                        .competing
                        .iter()
                        .chain(&direct.competing)
                        .copied()
                        .collect();
                    existing.competing = merged.into_iter().collect();
                }
                None => evidence.push(direct.clone()),
            }
            evidence.sort_by_key(|e| e.seq_num);
        }

        for equivocation in &evidence {
            let observed = equivocation
                .competing
                .iter()
                .filter(|h| closure.seen.contains(*h))
                .count();
            let involves_candidate = equivocation.competing.contains(&block.hash);
            if observed == 0 && !involves_candidate {
                continue;
            }

            if observed >= 2 && !acknowledges(block, dag, validator, equivocation) {
                return Err(ByzantineViolation::NeglectedEquivocation {
                    validator: *validator,
                });
            }

            for competing in &equivocation.competing {
                let class = if closure.honestly_cited.contains(competing) {
                    EquivocationClass::Admissible
                } else {
                    EquivocationClass::Ignorable
                };
                classified.push(ClassifiedEquivocation {
                    validator: *validator,
                    seq_num: equivocation.seq_num,
                    block: *competing,
                    class,
                });
            }
        }
    }
    Ok(classified)
}

/// The candidate's justification for `validator` names one of the competing
/// blocks, or a later block of `validator` whose creator chain leads to one.
fn acknowledges(
    block: &Block,
    dag: &BlockDag,
    validator: &ValidatorId,
    equivocation: &EquivocationEvidence,
) -> bool {
    if block.sender == *validator {
        return true;
    }
    let mut cursor = block.justifications.get(validator).copied();
    while let Some(hash) = cursor {
        if equivocation.competing.contains(&hash) {
            return true;
        }
        let Some(justified) = dag.get(&hash) else {
            return false;
        };
        // Sequence numbers strictly decrease along the walk.
        if justified.sender != *validator || justified.seq_num <= equivocation.seq_num {
            return false;
        }
        cursor = justified.creator_justification().copied();
    }
    false
}
