//! Structural lower bounds on the bottleneck value.
//!
//! Each oracle answers "does the subgraph of admitted edges have property X?"
//! for a [`Window`], and finds the smallest threshold with that property by a
//! binary search over the [`CostIndex`]. The constrained bounds also take
//! the tour length budget into account.

pub mod bap;
pub mod bbssp;
pub mod bscssp;
pub mod cbap;
pub mod cbst;

use std::time::Duration;

use crate::{
    Result,
    cost_index::CostIndex,
    problem::{Cost, Problem},
    window::Window,
};

/// Smallest threshold found by a bound oracle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundResult {
    pub objective: Cost,
    pub elapsed: Duration,
}

/// Lower-bound oracle selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoundKind {
    Bbssp,
    Bap,
    Bscssp,
    Cbap { max_length: Cost },
    Cbst { max_length: Cost },
}

/// Binary search for the smallest cost in `index` whose ceiling window
/// satisfies `predicate`. Converges on the largest cost when none does.
pub(crate) fn threshold_search(
    index: &CostIndex,
    mut predicate: impl FnMut(Window) -> bool,
) -> Cost {
    let costs = index.costs();
    let mut low = 0;
    let mut high = costs.len() - 1;

    while low != high {
        let median = low + (high - low) / 2;
        if predicate(Window::ceiling(costs[median])) {
            high = median;
        } else {
            low = median + 1;
        }
    }

    costs[low]
}

pub fn solve(kind: BoundKind, problem: &dyn Problem, index: &CostIndex) -> Result<BoundResult> {
    match kind {
        BoundKind::Bbssp => bbssp::solve(problem, index),
        BoundKind::Bap => bap::solve(problem, index),
        BoundKind::Bscssp => bscssp::solve(problem, index),
        BoundKind::Cbap { max_length } => cbap::solve(problem, index, max_length),
        BoundKind::Cbst { max_length } => cbst::solve(problem, max_length),
    }
}
