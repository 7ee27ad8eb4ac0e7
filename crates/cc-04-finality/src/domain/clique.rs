//! Maximum weighted clique search over the agreement graph.
//!
//! Vertices are indices `0..n`; `adjacency[v]` lists the neighbours of `v`
//! (symmetric, no self-loops). Both searches are deterministic: ties keep the
//! clique found first, and vertices are always visited in index order.

use std::collections::BTreeSet;

use super::cancel::{ScanCancel, ScanCancelled};

/// How a clique was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliqueMethod {
    /// Bron–Kerbosch with pivoting: the true maximum.
    Exact,
    /// Greedy maximal clique: a lower bound on the maximum.
    Approximate,
}

impl CliqueMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CliqueMethod::Exact => "exact",
            CliqueMethod::Approximate => "approximate",
        }
    }
}

/// A clique and its total weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightedClique {
    /// Member vertices, ascending.
    pub members: Vec<usize>,
    pub weight: u128,
}

fn weight_of<'a>(vertices: impl IntoIterator<Item = &'a usize>, weights: &[u128]) -> u128 {
    vertices.into_iter().map(|v| weights[*v]).sum()
}

/// Heaviest clique, by Bron–Kerbosch with pivoting and weight pruning.
pub fn max_weighted_clique(weights: &[u128], adjacency: &[BTreeSet<usize>]) -> WeightedClique {
    search(weights, adjacency, &ScanCancel::new())
}

/// [`max_weighted_clique`] that gives up once `cancel` is set.
pub fn max_weighted_clique_cancellable(
    weights: &[u128],
    adjacency: &[BTreeSet<usize>],
    cancel: &ScanCancel,
) -> Result<WeightedClique, ScanCancelled> {
    let clique = search(weights, adjacency, cancel);
    cancel.check()?;
    Ok(clique)
}

// Stops early when cancelled; the best clique so far is still a clique.
fn search(weights: &[u128], adjacency: &[BTreeSet<usize>], cancel: &ScanCancel) -> WeightedClique {
    let mut best = WeightedClique::default();
    let candidates: BTreeSet<usize> = (0..weights.len()).collect();
    let mut current = Vec::new();
    let mut state = Search {
        weights,
        adjacency,
        cancel,
        best: &mut best,
    };
    state.expand(&mut current, candidates, BTreeSet::new());
    best.members.sort_unstable();
    best
}

struct Search<'a> {
    weights: &'a [u128],
    adjacency: &'a [BTreeSet<usize>],
    cancel: &'a ScanCancel,
    best: &'a mut WeightedClique,
}

impl Search<'_> {
    fn expand(
        &mut self,
        current: &mut Vec<usize>,
        mut candidates: BTreeSet<usize>,
        mut excluded: BTreeSet<usize>,
    ) {
        if self.cancel.is_cancelled() {
            return;
        }
        let (weights, adjacency) = (self.weights, self.adjacency);
        let current_weight = weight_of(current.iter(), weights);
        if candidates.is_empty() {
            if excluded.is_empty() && current_weight > self.best.weight {
                self.best.members = current.clone();
                self.best.weight = current_weight;
            }
            return;
        }
        // Even taking every candidate cannot beat the best clique so far.
        if current_weight + weight_of(candidates.iter(), weights) <= self.best.weight {
            return;
        }

        let pivot = candidates
            .iter()
            .chain(excluded.iter())
            .copied()
            .max_by_key(|u| {
                (
                    candidates.intersection(&adjacency[*u]).count(),
                    std::cmp::Reverse(*u),
                )
            });
        let branch: Vec<usize> = match pivot {
            Some(u) => candidates.difference(&adjacency[u]).copied().collect(),
            None => candidates.iter().copied().collect(),
        };

        for v in branch {
            current.push(v);
            let next_candidates = candidates.intersection(&adjacency[v]).copied().collect();
            let next_excluded = excluded.intersection(&adjacency[v]).copied().collect();
            self.expand(current, next_candidates, next_excluded);
            current.pop();
            candidates.remove(&v);
            excluded.insert(v);
        }
    }
}

/// Maximal clique built greedily, heaviest vertex first.
pub fn greedy_clique(weights: &[u128], adjacency: &[BTreeSet<usize>]) -> WeightedClique {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|a, b| weights[*b].cmp(&weights[*a]).then(a.cmp(b)));

    let mut members: Vec<usize> = Vec::new();
    for v in order {
        if members.iter().all(|m| adjacency[v].contains(m)) {
            members.push(v);
        }
    }
    members.sort_unstable();
    let weight = weight_of(members.iter(), weights);
    WeightedClique { members, weight }
}
