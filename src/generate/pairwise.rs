//! Greedy construction of a 2-way covering array over the optional
//! parameters, honoring choice exclusion. Randomness is confined to the
//! candidate sampler and is fully determined by the configured seed.
//!
//! Pair bookkeeping is index-based and transient: a pattern's pair set is
//! folded into the global covered set and dropped, so memory stays
//! proportional to the covered set, not to the pattern count.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::optional::OptionalSet;

/// One intended XML document: a full true/false assignment over the
/// parameter universe. Paths not in the map default to false.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPattern {
    pub id: usize,
    pub assignments: BTreeMap<String, bool>,
}

impl TestPattern {
    pub fn assignment(&self, path: &str) -> bool {
        self.assignments.get(path).copied().unwrap_or(false)
    }

    /// The paths this pattern turns on.
    pub fn included_paths(&self) -> HashSet<String> {
        self.assignments
            .iter()
            .filter(|(_, on)| **on)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct CoveringArray {
    pub parameters: Vec<String>,
    pub patterns: Vec<TestPattern>,
    /// Fraction of valid pairs the patterns jointly realize.
    pub coverage: f64,
    pub strength: u32,
}

#[derive(Clone, Debug)]
pub struct PairwiseConfig {
    pub max_patterns: usize,
    /// Random candidates drawn per greedy round.
    pub candidates: usize,
    pub random_seed: u64,
    /// Truncate the universe to the highest-priority parameters.
    pub max_parameters: Option<usize>,
    /// Above this covered-set size, candidate scores are sampled estimates.
    pub sample_threshold: usize,
    pub sample_size: usize,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        PairwiseConfig {
            max_patterns: 50,
            candidates: 30,
            random_seed: 42,
            max_parameters: None,
            sample_threshold: 100_000,
            sample_size: 10_000,
        }
    }
}

/// `(smaller index, its value, larger index, its value)`.
type Pair = (u32, bool, u32, bool);

pub struct PairwiseGenerator {
    config: PairwiseConfig,
}

impl PairwiseGenerator {
    pub fn new(config: PairwiseConfig) -> Self {
        PairwiseGenerator { config }
    }

    pub fn generate(&self, optional: &OptionalSet) -> CoveringArray {
        let (parameters, group_of) = self.select_parameters(optional);
        let mut run = Run {
            config: &self.config,
            groups: collect_groups(&group_of),
            group_of,
            parameters,
            rng: StdRng::seed_from_u64(self.config.random_seed),
        };
        run.generate()
    }

    /// Applies the `max_parameters` cap, keeping the highest-priority items
    /// and preserving traversal order among the survivors.
    fn select_parameters(&self, optional: &OptionalSet) -> (Vec<String>, Vec<Option<usize>>) {
        let items = optional.items();
        let mut indices: Vec<usize> = (0..items.len()).collect();
        if let Some(cap) = self.config.max_parameters {
            if items.len() > cap {
                info!(
                    "parameter universe has {} items, truncating to the top {cap} by priority",
                    items.len()
                );
                indices.sort_by(|a, b| {
                    items[*b]
                        .priority
                        .cmp(&items[*a].priority)
                        .then(a.cmp(b))
                });
                indices.truncate(cap);
                indices.sort_unstable();
            }
        }
        let parameters = indices.iter().map(|i| items[*i].path.clone()).collect();
        let group_of = indices.iter().map(|i| items[*i].choice_group).collect();
        (parameters, group_of)
    }
}

/// Choice groups as parameter-index lists; groups with a single surviving
/// member impose no constraint but are kept for adjustment symmetry.
fn collect_groups(group_of: &[Option<usize>]) -> Vec<Vec<usize>> {
    let mut by_id: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, group) in group_of.iter().enumerate() {
        if let Some(id) = group {
            by_id.entry(*id).or_default().push(index);
        }
    }
    by_id.into_values().collect()
}

struct Run<'a> {
    config: &'a PairwiseConfig,
    parameters: Vec<String>,
    group_of: Vec<Option<usize>>,
    groups: Vec<Vec<usize>>,
    rng: StdRng,
}

impl Run<'_> {
    fn generate(&mut self) -> CoveringArray {
        let n = self.parameters.len();
        let total = self.total_pairs();
        info!(
            "pairwise generation: {n} parameters, {total} valid pairs, cap {} patterns",
            self.config.max_patterns
        );

        let mut covered: HashSet<Pair> = HashSet::new();
        let mut covered_count: usize = 0;
        let mut patterns: Vec<TestPattern> = Vec::new();

        // Seed patterns: everything on (after choice adjustment), then
        // everything off.
        for seed in [vec![true; n], vec![false; n]] {
            let mut assignment = seed;
            self.adjust_for_choices(&mut assignment);
            let new = self.fold(&assignment, &mut covered);
            covered_count += new;
            patterns.push(self.pattern(patterns.len(), &assignment));
            debug!(
                "pattern {}: {new} new pairs, {} remaining",
                patterns.len() - 1,
                total - covered_count
            );
        }

        while covered_count < total && patterns.len() < self.config.max_patterns {
            let Some((assignment, estimate)) = self.best_candidate(&covered) else {
                break;
            };
            if estimate == 0 {
                break;
            }
            let new = self.fold(&assignment, &mut covered);
            if new == 0 {
                break;
            }
            covered_count += new;
            patterns.push(self.pattern(patterns.len(), &assignment));
            debug!(
                "pattern {}: {new} new pairs, {} remaining",
                patterns.len() - 1,
                total - covered_count
            );
        }

        let coverage = if total == 0 {
            1.0
        } else {
            covered_count as f64 / total as f64
        };
        info!(
            "pairwise generation done: {} patterns, {:.2}% pair coverage",
            patterns.len(),
            coverage * 100.0
        );
        CoveringArray {
            parameters: self.parameters.clone(),
            patterns,
            coverage,
            strength: 2,
        }
    }

    /// Counts valid pairs without materializing them: 4 per unrelated pair,
    /// 3 per choice-sibling pair (both-true is invalid).
    fn total_pairs(&self) -> usize {
        let n = self.parameters.len();
        let mut count = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                count += if self.same_group(i, j) { 3 } else { 4 };
            }
        }
        count
    }

    fn same_group(&self, i: usize, j: usize) -> bool {
        matches!((self.group_of[i], self.group_of[j]), (Some(a), Some(b)) if a == b)
    }

    /// The pairs an assignment realizes, in deterministic index order.
    fn covered_pairs(&self, assignment: &[bool]) -> Vec<Pair> {
        let n = assignment.len();
        let mut pairs = Vec::with_capacity(n.saturating_mul(n.saturating_sub(1)) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                if assignment[i] && assignment[j] && self.same_group(i, j) {
                    continue;
                }
                pairs.push((i as u32, assignment[i], j as u32, assignment[j]));
            }
        }
        pairs
    }

    /// Folds an assignment's pairs into the covered set, returning the
    /// exact number of newly covered pairs. The pair list dies here.
    fn fold(&self, assignment: &[bool], covered: &mut HashSet<Pair>) -> usize {
        let mut new = 0;
        for pair in self.covered_pairs(assignment) {
            if covered.insert(pair) {
                new += 1;
            }
        }
        new
    }

    /// Draws random candidate assignments and keeps the one contributing
    /// the most uncovered pairs (first seen wins ties).
    fn best_candidate(&mut self, covered: &HashSet<Pair>) -> Option<(Vec<bool>, usize)> {
        let n = self.parameters.len();
        let mut best: Option<(Vec<bool>, usize)> = None;
        for _ in 0..self.config.candidates {
            let mut assignment: Vec<bool> = (0..n).map(|_| self.rng.gen_bool(0.5)).collect();
            self.adjust_for_choices(&mut assignment);
            let score = self.score(&assignment, covered);
            if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((assignment, score));
            }
        }
        best
    }

    /// New-pair count for a candidate; switches to a sampled estimate once
    /// the covered set is large enough that exact scoring dominates runtime.
    fn score(&mut self, assignment: &[bool], covered: &HashSet<Pair>) -> usize {
        let pairs = self.covered_pairs(assignment);
        if covered.len() > self.config.sample_threshold && pairs.len() > self.config.sample_size
        {
            let sampled =
                rand::seq::index::sample(&mut self.rng, pairs.len(), self.config.sample_size);
            let hits = sampled
                .iter()
                .filter(|i| !covered.contains(&pairs[*i]))
                .count();
            hits * pairs.len() / self.config.sample_size
        } else {
            pairs.iter().filter(|p| !covered.contains(*p)).count()
        }
    }

    /// Retains a single seeded-random choice among colliding alternatives.
    fn adjust_for_choices(&mut self, assignment: &mut [bool]) {
        for group in &self.groups {
            let on: Vec<usize> = group
                .iter()
                .copied()
                .filter(|i| assignment[*i])
                .collect();
            if on.len() > 1 {
                let keep = on[self.rng.gen_range(0..on.len())];
                for index in on {
                    if index != keep {
                        assignment[index] = false;
                    }
                }
            }
        }
    }

    fn pattern(&self, id: usize, assignment: &[bool]) -> TestPattern {
        TestPattern {
            id,
            assignments: self
                .parameters
                .iter()
                .cloned()
                .zip(assignment.iter().copied())
                .collect(),
        }
    }
}
