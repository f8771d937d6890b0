//! Balanced TSP: minimise the gap between the largest and the smallest edge
//! of a tour.
//!
//! Both searches report the gap as the result objective and return the best
//! structural lower bound on it they came across.

mod double_threshold;
mod iterative;

pub use double_threshold::double_threshold;
pub use iterative::iterative_bottleneck;

use crate::{
    bound::{bap, bbssp, bscssp},
    problem::{Cost, Problem},
    window::Window,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BalancedParams {
    /// Cost the upper end of the window starts from.
    pub lower_bound: Cost,
    /// Largest cost the window may start from.
    pub upper_bound: Cost,
    /// Only evaluate the structural bounds, never call a tour solver.
    pub lb_only: bool,
    /// Prune windows that cannot beat the best gap found so far.
    pub with_improvements: bool,
    /// Cost given to edges the iterative search hides.
    pub infinity: Cost,
}

/// Whether the admitted edges of `window` could carry a tour at all: the
/// graph is biconnected, has a cycle cover, and for directed problems is
/// strongly connected.
pub fn lower_bound_feasible(problem: &dyn Problem, window: Window) -> bool {
    bbssp::biconnected(problem, window)
        && bap::has_assignment(problem, window)
        && (problem.is_symmetric() || bscssp::strongly_connected(problem, window))
}
