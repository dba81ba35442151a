//! Budget-constrained selection with relaxation.
//!
//! The RNG is injected and seedable so tests can assert sizes and bounds
//! without asserting exact membership. An unknown cost always counts as
//! within budget: missing data should widen the net, not narrow it.

use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

use crate::types::{BudgetQuery, CandidateRecipe};

pub const MIN_RESULTS: usize = 10;
pub const MAX_RESULTS: usize = 15;

/// Ceiling multiplier applied when too few candidates satisfy the strict
/// budget.
pub const RELAX_FACTOR: f64 = 1.5;

/// Select 10-15 candidates under the optional ceiling.
///
/// Whenever 10 or more candidates are eligible at some relaxation level the
/// result size lands in [10, 15]; otherwise the result is exactly the
/// eligible set.
pub fn select<R: Rng>(
    candidates: Vec<CandidateRecipe>,
    budget: BudgetQuery,
    rng: &mut R,
) -> Vec<CandidateRecipe> {
    let Some(ceiling) = budget.0 else {
        let mut pool = candidates;
        pool.shuffle(rng);
        return take_sample(pool, rng);
    };

    let within: Vec<CandidateRecipe> = candidates
        .iter()
        .filter(|c| within_budget(c, ceiling))
        .cloned()
        .collect();

    if within.len() >= MIN_RESULTS {
        // Keep the cheapest 15, then randomize membership and size.
        let mut pool = within;
        pool.sort_by(compare_cost);
        pool.truncate(MAX_RESULTS);
        pool.shuffle(rng);
        return take_sample(pool, rng);
    }

    // Not enough under the strict ceiling: relax it and put strict-budget
    // items first.
    let relaxed = ceiling * RELAX_FACTOR;
    let mut eligible: Vec<CandidateRecipe> = candidates
        .into_iter()
        .filter(|c| within_budget(c, relaxed))
        .collect();
    eligible.sort_by(|a, b| {
        let a_over = !within_budget(a, ceiling);
        let b_over = !within_budget(b, ceiling);
        a_over.cmp(&b_over).then_with(|| compare_cost(a, b))
    });

    if eligible.len() < MIN_RESULTS {
        return eligible;
    }
    let size = rng.gen_range(MIN_RESULTS..=MAX_RESULTS).min(eligible.len());
    eligible.truncate(size);
    eligible
}

fn take_sample<R: Rng>(mut pool: Vec<CandidateRecipe>, rng: &mut R) -> Vec<CandidateRecipe> {
    if pool.len() < MIN_RESULTS {
        return pool;
    }
    let size = rng.gen_range(MIN_RESULTS..=MAX_RESULTS).min(pool.len());
    pool.truncate(size);
    pool
}

fn within_budget(candidate: &CandidateRecipe, ceiling: f64) -> bool {
    candidate
        .estimated_cost
        .map(|cost| cost <= ceiling)
        .unwrap_or(true)
}

/// Unknown costs sort last.
fn compare_cost(a: &CandidateRecipe, b: &CandidateRecipe) -> Ordering {
    let a_cost = a.estimated_cost.unwrap_or(f64::MAX);
    let b_cost = b.estimated_cost.unwrap_or(f64::MAX);
    a_cost.partial_cmp(&b_cost).unwrap_or(Ordering::Equal)
}
