//! Enhanced binary search threshold (EBST).
//!
//! Checks the lower bound first, then binary searches the distinct costs for
//! the smallest threshold at which the plan still finds a tour. Solvers may
//! return tours better than asked for, so every answer re-derives the upper
//! end of the search from the bottleneck actually achieved.

use std::time::Instant;

use crate::{
    Error, Result,
    cost_index::CostIndex,
    feasible::{Verdict, feasible},
    plan::SolvePlan,
    problem::{Cost, Problem},
    result::SearchResult,
    solver::TourSolver,
    window::Window,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    pub lower_bound: Cost,
    /// Largest bottleneck worth looking at. The search also never looks
    /// above the result's current objective.
    pub upper_bound: Option<Cost>,
    /// Stop after the lower-bound check.
    pub suppress_ebst: bool,
}

impl SearchParams {
    pub fn new(lower_bound: Cost) -> Self {
        Self {
            lower_bound,
            upper_bound: None,
            suppress_ebst: false,
        }
    }
}

/// Runs the search and refines `result` as it goes, so the tally and the
/// best tour so far survive a solver failure.
///
/// With a `confirm` plan the final objective is re-checked one unit lower.
/// A tour found there replaces the result; no tour proves it optimal.
#[btsp_derive::timer("ebst.solve")]
pub fn solve(
    problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    confirm: Option<&mut SolvePlan>,
    solver: &mut dyn TourSolver,
    params: &SearchParams,
    result: &mut SearchResult,
) -> Result<()> {
    let started = Instant::now();
    let outcome = run(problem, index, plan, confirm, solver, params, result);
    result.elapsed = started.elapsed();
    outcome
}

fn run(
    problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    confirm: Option<&mut SolvePlan>,
    solver: &mut dyn TourSolver,
    params: &SearchParams,
    result: &mut SearchResult,
) -> Result<()> {
    check_bounds(index, params)?;
    result.optimal = false;

    let lower = params.lower_bound;
    let verdict = check_at(problem, index, plan, solver, lower, result)?;
    if verdict.feasible {
        result.optimal = true;
    } else if let Some(found) = &verdict.tour
        && result.improves(found.max_cost)
    {
        result.record(found.max_cost, found);
    }

    if !result.optimal && !params.suppress_ebst {
        binary_search(problem, index, plan, solver, params, result)?;
    }

    if let Some(confirm) = confirm
        && !result.optimal
        && let Some(objective) = result.objective
    {
        let verdict = check_at(problem, index, confirm, solver, objective - 1, result)?;
        if verdict.feasible {
            log::debug!("ebst.confirm: cheaper tour than {objective}");
        } else {
            log::debug!("ebst.confirm: no tour below {objective}");
            result.optimal = true;
        }
    }

    if result.objective == Some(lower) {
        result.optimal = true;
    }
    log::info!(
        "ebst.done: objective={:?} optimal={} steps={}",
        result.objective,
        result.optimal,
        result.binary_search_steps
    );
    Ok(())
}

fn check_bounds(index: &CostIndex, params: &SearchParams) -> Result<()> {
    if params.lower_bound > index.max() {
        return Err(Error::invalid_input(format!(
            "Lower bound {} is above every edge cost (max {})",
            params.lower_bound,
            index.max()
        )));
    }
    if let Some(upper) = params.upper_bound
        && upper < index.min()
    {
        return Err(Error::invalid_input(format!(
            "Upper bound {upper} is below every edge cost (min {})",
            index.min()
        )));
    }
    Ok(())
}

/// One feasibility question at `delta`. A feasible answer is recorded
/// right away.
fn check_at(
    problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    solver: &mut dyn TourSolver,
    delta: Cost,
    result: &mut SearchResult,
) -> Result<Verdict> {
    let verdict = feasible(
        problem,
        index,
        plan,
        solver,
        Window::ceiling(delta),
        &mut result.solvers,
    )?;
    log::debug!("ebst.check: delta={delta} feasible={}", verdict.feasible);

    if verdict.feasible
        && let Some(found) = &verdict.tour
    {
        result.record(found.max_cost, found);
    }
    Ok(verdict)
}

fn binary_search(
    problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    solver: &mut dyn TourSolver,
    params: &SearchParams,
    result: &mut SearchResult,
) -> Result<()> {
    let mut low = index
        .rank(params.lower_bound)
        .or_else(|| index.floor_rank(params.lower_bound))
        .unwrap_or(0);

    let ceiling = match (result.objective, params.upper_bound) {
        (Some(best), Some(upper)) => Some(best.min(upper)),
        (best, upper) => best.or(upper),
    };
    let mut high = ceiling
        .and_then(|cost| index.floor_rank(cost))
        .unwrap_or(index.last_rank());
    low = low.min(high);

    while low != high {
        let median = low + (high - low) / 2;
        let delta = index.costs()[median];
        log::trace!(
            "ebst.search: low={} high={} delta={delta}",
            index.costs()[low],
            index.costs()[high]
        );

        let verdict = check_at(problem, index, plan, solver, delta, result)?;
        result.binary_search_steps += 1;

        if verdict.feasible {
            high = match &verdict.tour {
                Some(found) if found.max_cost < delta => {
                    index.floor_rank(found.max_cost).unwrap_or(median)
                }
                _ => median,
            };
        } else {
            low = median + 1;
            if let Some(found) = &verdict.tour
                && result.improves(found.max_cost)
            {
                log::debug!(
                    "ebst.upper_bound: infeasible check returned bottleneck {}",
                    found.max_cost
                );
                result.record(found.max_cost, found);
                if let Some(rank) = index.floor_rank(found.max_cost) {
                    high = high.min(rank);
                }
            }
        }
        low = low.min(high);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SearchParams, solve};
    use crate::{
        Error,
        cost_index::CostIndex,
        fixtures::{self, Scripted},
        plan::{PlanStep, SolvePlan},
        result::SearchResult,
        solver::{LkParams, SolverKind, SolverParams, Solvers},
        transform::Transform,
    };

    // Bottlenecks on the five node fixture: GOOD 4, BAD 10.
    const GOOD: [usize; 5] = [0, 2, 3, 1, 4];
    const BAD: [usize; 5] = [0, 2, 1, 3, 4];

    fn plan(solver: SolverParams) -> SolvePlan {
        SolvePlan::new(vec![PlanStep::new(solver, Transform::basic(), 1)])
    }

    fn lk_plan() -> SolvePlan {
        plan(SolverParams::LinKernighan(LkParams::for_size(5)))
    }

    fn exact_plan() -> SolvePlan {
        plan(SolverParams::Exact)
    }

    #[test]
    fn scripted_search_narrows_to_the_achieved_bottleneck() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        // Checks: lower bound 3, median 8, median 3.
        let mut solver = Scripted::new(vec![BAD.to_vec(), GOOD.to_vec(), BAD.to_vec()]);
        let mut result = SearchResult::default();

        solve(
            &problem,
            &index,
            &mut lk_plan(),
            None,
            &mut solver,
            &SearchParams::new(3),
            &mut result,
        )
        .expect("search");

        assert!(result.found_tour);
        assert_eq!(result.objective, Some(4));
        assert!(!result.optimal);
        assert_eq!(result.binary_search_steps, 2);
        assert_eq!(result.tour, GOOD.to_vec());
        assert_eq!(result.solvers.get(SolverKind::LinKernighan).attempts, 3);
    }

    #[test]
    fn exact_search_finds_the_optimum_but_needs_confirmation() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut solver = Solvers::new(1);
        let mut result = SearchResult::default();

        solve(
            &problem,
            &index,
            &mut exact_plan(),
            None,
            &mut solver,
            &SearchParams::new(3),
            &mut result,
        )
        .expect("search");
        assert_eq!(result.objective, Some(4));
        assert!(!result.optimal);

        let mut confirmed = SearchResult::default();
        solve(
            &problem,
            &index,
            &mut exact_plan(),
            Some(&mut exact_plan()),
            &mut solver,
            &SearchParams::new(3),
            &mut confirmed,
        )
        .expect("search");
        assert_eq!(confirmed.objective, Some(4));
        assert!(confirmed.optimal);
        assert_eq!(
            confirmed.solvers.get(SolverKind::Exact).attempts,
            result.solvers.get(SolverKind::Exact).attempts + 1
        );
    }

    #[test]
    fn feasible_lower_bound_is_optimal_without_searching() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut result = SearchResult::default();

        solve(
            &problem,
            &index,
            &mut exact_plan(),
            None,
            &mut Solvers::new(1),
            &SearchParams::new(4),
            &mut result,
        )
        .expect("search");

        assert!(result.optimal);
        assert_eq!(result.objective, Some(4));
        assert_eq!(result.binary_search_steps, 0);
    }

    #[test]
    fn suppressed_search_stops_after_the_lower_bound_check() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut solver = Scripted::new(vec![BAD.to_vec()]);
        let mut result = SearchResult::default();
        let params = SearchParams {
            suppress_ebst: true,
            ..SearchParams::new(3)
        };

        solve(
            &problem,
            &index,
            &mut lk_plan(),
            None,
            &mut solver,
            &params,
            &mut result,
        )
        .expect("search");

        assert!(!result.found_tour);
        assert!(!result.optimal);
        assert_eq!(solver.calls, 1);
    }

    #[test]
    fn infeasible_checks_still_tighten_the_upper_end() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut plan = SolvePlan::new(vec![
            PlanStep::new(
                SolverParams::LinKernighan(LkParams::for_size(5)),
                Transform::basic(),
                1,
            )
            .with_upper_bound_update(),
        ]);
        // Checks: lower bound 1, then 2 and 3 below the recorded 4.
        let mut solver = Scripted::new(vec![GOOD.to_vec(), BAD.to_vec(), BAD.to_vec()]);
        let mut result = SearchResult::default();

        solve(
            &problem,
            &index,
            &mut plan,
            None,
            &mut solver,
            &SearchParams::new(1),
            &mut result,
        )
        .expect("search");

        assert_eq!(result.objective, Some(4));
        assert_eq!(result.binary_search_steps, 2);
        assert_eq!(solver.calls, 3);
    }

    #[test]
    fn bounds_outside_the_costs_are_rejected() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut solver = Scripted::new(Vec::new());

        for params in [
            SearchParams::new(11),
            SearchParams {
                upper_bound: Some(0),
                ..SearchParams::new(1)
            },
        ] {
            let err = solve(
                &problem,
                &index,
                &mut lk_plan(),
                None,
                &mut solver,
                &params,
                &mut SearchResult::default(),
            )
            .expect_err("bound outside the cost list");
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert_eq!(solver.calls, 0);
    }

    #[test]
    fn solver_failure_keeps_the_statistics() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut solver = Scripted::new(vec![BAD.to_vec()]);
        let mut result = SearchResult::default();

        let err = solve(
            &problem,
            &index,
            &mut lk_plan(),
            None,
            &mut solver,
            &SearchParams::new(3),
            &mut result,
        );

        assert!(err.is_err());
        assert_eq!(result.solvers.total().attempts, 1);
        assert!(!result.found_tour);
    }
}
