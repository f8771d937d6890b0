use std::time::Instant;

use rayon::prelude::*;

use super::BalancedParams;
use crate::{
    Error, Result,
    bound::{BoundResult, bbssp},
    cost_index::CostIndex,
    plan::SolvePlan,
    problem::{Cost, Problem},
    result::{FoundTour, SearchResult},
    search::{self, SearchParams},
    solver::TourSolver,
    transform::Transform,
    window::Window,
};

/// For each candidate smallest edge `cost[i]`, hides every cheaper edge and
/// runs a bottleneck search on what is left, but only when the BBSSP bound
/// of that problem leaves room to beat the best gap.
#[btsp_derive::timer("baltsp.iterative_bottleneck")]
pub fn iterative_bottleneck(
    problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    solver: &mut dyn TourSolver,
    params: &BalancedParams,
    result: &mut SearchResult,
) -> Result<BoundResult> {
    if !problem.is_symmetric() {
        return Err(Error::invalid_input(
            "The iterative bottleneck search needs a symmetric cost matrix",
        ));
    }

    let started = Instant::now();
    let costs = index.costs();
    let max = index.rank(params.upper_bound).unwrap_or(index.last_rank());
    let hide = Transform::iterative_bottleneck(params.infinity);

    let lb_started = Instant::now();
    let btsp_lb = bottleneck_bounds(problem, index, &hide, max)?;
    let lb_elapsed = lb_started.elapsed();
    let lb_objective = btsp_lb
        .iter()
        .zip(costs)
        .filter_map(|(lb, &cost)| lb.map(|lb| lb - cost))
        .min()
        .unwrap_or(index.max() - index.min());

    let mut low = 0;
    while !params.lb_only && low <= max {
        let low_val = costs[low];
        result.binary_search_steps += 1;

        let best_gap = result.objective.unwrap_or(index.max() - index.min());
        if let Some(lower_bound) = btsp_lb[low]
            && lower_bound - low_val < best_gap
        {
            log::debug!("baltsp.ib: floor={low_val} bbssp={lower_bound} best_gap={best_gap}");
            let view = hide.apply(problem, Window::new(low_val, index.max()));
            let mut current = SearchResult::default();
            let outcome = search::solve(
                &view,
                index,
                plan,
                None,
                solver,
                &SearchParams::new(lower_bound),
                &mut current,
            );
            result.solvers += &current.solvers;
            outcome?;

            if current.found_tour {
                let found = FoundTour::measure(problem, current.tour)?;
                if result.improves(found.gap()) {
                    log::debug!(
                        "baltsp.ib: tour in [{},{}] gap={}",
                        found.min_cost,
                        found.max_cost,
                        found.gap()
                    );
                    result.record(found.gap(), &found);
                }
            }
        }

        low += 1;
        if low > max || btsp_lb[low].is_none_or(|lb| lb >= index.max()) {
            break;
        }
    }

    result.elapsed = started.elapsed();
    log::info!(
        "baltsp.ib: lower_bound={lb_objective} gap={:?} steps={}",
        result.objective,
        result.binary_search_steps
    );
    Ok(BoundResult {
        objective: lb_objective,
        elapsed: lb_elapsed,
    })
}

/// BBSSP bound of the problem with every edge below `cost[i]` hidden, for
/// each rank `i` up to `max`. `None` when what is left can never be
/// biconnected. The bounds are independent and run in parallel.
fn bottleneck_bounds(
    problem: &dyn Problem,
    index: &CostIndex,
    hide: &Transform,
    max: usize,
) -> Result<Vec<Option<Cost>>> {
    let costs = index.costs();
    let bounds = (0..=max)
        .into_par_iter()
        .map(|i| {
            let view = hide.apply(problem, Window::new(costs[i], index.max()));
            if !bbssp::biconnected(&view, Window::ceiling(index.max())) {
                return Ok(None);
            }
            bbssp::solve(&view, index).map(|bound| Some(bound.objective))
        })
        .collect::<Result<Vec<_>>>()?;

    for (cost, bound) in costs.iter().zip(&bounds) {
        log::trace!("baltsp.ib: floor={cost} bbssp={bound:?}");
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::iterative_bottleneck;
    use crate::{
        Error,
        balanced::BalancedParams,
        cost_index::CostIndex,
        fixtures,
        plan::{PlanStep, SolvePlan},
        problem::{tour_cost_range, validate_tour},
        result::SearchResult,
        solver::{SolverParams, Solvers},
        transform::Transform,
    };

    fn exact_basic() -> SolvePlan {
        SolvePlan::new(vec![PlanStep::new(
            SolverParams::Exact,
            Transform::basic(),
            1,
        )])
    }

    fn params(lb_only: bool) -> BalancedParams {
        BalancedParams {
            lower_bound: 1,
            upper_bound: 10,
            lb_only,
            with_improvements: false,
            infinity: 10_000,
        }
    }

    #[test]
    fn finds_the_smallest_gap_on_the_five_node_problem() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut result = SearchResult::default();

        let bound = iterative_bottleneck(
            &problem,
            &index,
            &mut exact_basic(),
            &mut Solvers::new(2),
            &params(false),
            &mut result,
        )
        .expect("search");

        assert_eq!(result.objective, Some(3));
        validate_tour(5, &result.tour).expect("valid tour");
        assert_eq!(tour_cost_range(&problem, &result.tour), Some((1, 4)));
        // BBSSP with nothing hidden is 3, against a floor of 1.
        assert_eq!(bound.objective, 2);
        assert!(result.binary_search_steps >= 1);
    }

    #[test]
    fn lower_bound_only_skips_the_searches() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut result = SearchResult::default();

        let bound = iterative_bottleneck(
            &problem,
            &index,
            &mut exact_basic(),
            &mut Solvers::new(2),
            &params(true),
            &mut result,
        )
        .expect("search");

        assert_eq!(bound.objective, 2);
        assert!(!result.found_tour);
        assert_eq!(result.binary_search_steps, 0);
    }

    #[test]
    fn directed_problems_are_rejected() {
        let problem = fixtures::directed_three();
        let index = CostIndex::build(&problem, true).expect("index");
        let err = iterative_bottleneck(
            &problem,
            &index,
            &mut exact_basic(),
            &mut Solvers::new(2),
            &params(false),
            &mut SearchResult::default(),
        )
        .expect_err("directed input");
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
