use std::time::{Duration, Instant};

use super::{BalancedParams, lower_bound_feasible};
use crate::{
    Result,
    bound::BoundResult,
    cost_index::CostIndex,
    feasible::feasible,
    plan::SolvePlan,
    problem::Problem,
    result::SearchResult,
    solver::TourSolver,
    window::Window,
};

/// Two-pointer search over windows `[cost[low], cost[high]]`.
///
/// A window that passes the structural gate is handed to the plan, which
/// runs on `solve_problem` (the base problem, or its doubled form for
/// directed input). A feasible window moves the lower end up, an infeasible
/// one widens the upper end.
#[btsp_derive::timer("baltsp.double_threshold")]
pub fn double_threshold(
    problem: &dyn Problem,
    solve_problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    solver: &mut dyn TourSolver,
    params: &BalancedParams,
    result: &mut SearchResult,
) -> Result<BoundResult> {
    let started = Instant::now();
    let costs = index.costs();
    let span = index.max() - index.min();

    let mut low = 0;
    let mut high = index.rank(params.lower_bound).unwrap_or(0);
    let max = index.rank(params.upper_bound).unwrap_or(index.last_rank());

    let mut best_lb = None;
    let mut lb_time = Duration::ZERO;

    while low <= high && high < costs.len() {
        let window = Window::new(costs[low], costs[high]);
        let best_gap = result.objective.unwrap_or(span);
        if params.with_improvements && best_gap + params.upper_bound <= window.max {
            log::debug!("baltsp.dt: gap {best_gap} cannot improve from {window}");
            break;
        }
        if low > max {
            break;
        }
        result.binary_search_steps += 1;

        let gate_started = Instant::now();
        let mut is_feasible = lower_bound_feasible(problem, window);
        lb_time += gate_started.elapsed();

        let mut found = None;
        if is_feasible {
            let gap = window.max - window.min;
            if best_lb.is_none_or(|best| gap < best) {
                best_lb = Some(gap);
            }
            if !params.lb_only {
                let verdict = feasible(
                    solve_problem,
                    index,
                    plan,
                    solver,
                    window,
                    &mut result.solvers,
                )?;
                is_feasible = verdict.feasible;
                found = verdict.tour;
            }
        }
        log::debug!("baltsp.dt: window={window} feasible={is_feasible}");

        if !is_feasible {
            high += 1;
            if params.with_improvements {
                let best_gap = if params.lb_only {
                    best_lb.unwrap_or(span)
                } else {
                    result.objective.unwrap_or(span)
                };
                while high < costs.len() && low < high && costs[high] - costs[low] >= best_gap {
                    low += 1;
                }
            }
            continue;
        }

        match found {
            Some(tour) if result.improves(tour.gap()) => {
                log::debug!(
                    "baltsp.dt: tour in [{},{}] gap={}",
                    tour.min_cost,
                    tour.max_cost,
                    tour.gap()
                );
                result.record(tour.gap(), &tour);
                while low < costs.len() && tour.min_cost >= costs[low] {
                    low += 1;
                }
            }
            _ => low += 1,
        }
    }

    result.elapsed = started.elapsed();
    let objective = best_lb.unwrap_or(span);
    log::info!(
        "baltsp.dt: lower_bound={objective} gap={:?} steps={}",
        result.objective,
        result.binary_search_steps
    );
    Ok(BoundResult {
        objective,
        elapsed: lb_time,
    })
}

#[cfg(test)]
mod tests {
    use super::double_threshold;
    use crate::{
        balanced::BalancedParams,
        cost_index::CostIndex,
        fixtures,
        plan::{PlanStep, SolvePlan},
        problem::{DoubledProblem, Problem, tour_cost_range, validate_tour},
        result::SearchResult,
        solver::{SolverKind, SolverParams, Solvers},
        transform::Transform,
    };

    fn exact_balanced() -> SolvePlan {
        SolvePlan::new(vec![PlanStep::new(
            SolverParams::Exact,
            Transform::balanced(),
            1,
        )])
    }

    fn params(problem: &dyn Problem, index: &CostIndex) -> BalancedParams {
        BalancedParams {
            lower_bound: index.min(),
            upper_bound: index.max(),
            lb_only: false,
            with_improvements: false,
            infinity: 1000 * problem.size() as i64,
        }
    }

    #[test]
    fn exact_plan_finds_the_smallest_gap() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut result = SearchResult::default();

        let bound = double_threshold(
            &problem,
            &problem,
            &index,
            &mut exact_balanced(),
            &mut Solvers::new(1),
            &params(&problem, &index),
            &mut result,
        )
        .expect("search");

        // Best window is [1,4], carried by 0-2-3-1-4.
        assert_eq!(result.objective, Some(3));
        validate_tour(5, &result.tour).expect("valid tour");
        assert_eq!(tour_cost_range(&problem, &result.tour), Some((1, 4)));
        assert!(bound.objective <= 3);
        assert!(result.solvers.get(SolverKind::Exact).attempts > 0);
    }

    #[test]
    fn lower_bound_only_never_calls_a_solver() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut result = SearchResult::default();
        let params = BalancedParams {
            lb_only: true,
            ..params(&problem, &index)
        };

        let bound = double_threshold(
            &problem,
            &problem,
            &index,
            &mut exact_balanced(),
            &mut Solvers::new(1),
            &params,
            &mut result,
        )
        .expect("search");

        assert!(!result.found_tour);
        assert_eq!(result.solvers.total().attempts, 0);
        assert!(bound.objective <= 3);
        assert!(result.binary_search_steps > 0);
    }

    #[test]
    fn improvements_keep_the_optimum() {
        let problem = fixtures::five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let mut pruned = SearchResult::default();

        double_threshold(
            &problem,
            &problem,
            &index,
            &mut exact_balanced(),
            &mut Solvers::new(1),
            &BalancedParams {
                with_improvements: true,
                ..params(&problem, &index)
            },
            &mut pruned,
        )
        .expect("search");

        assert_eq!(pruned.objective, Some(3));
    }

    #[test]
    fn directed_problems_search_their_doubled_form() {
        let problem = fixtures::directed_three();
        let index = CostIndex::build(&problem, true).expect("index");
        let doubled = DoubledProblem::new(&problem, 1000);
        let mut plan = SolvePlan::new(vec![PlanStep::new(
            SolverParams::Exact,
            Transform::asym_shift(1000),
            1,
        )]);
        let mut result = SearchResult::default();

        double_threshold(
            &problem,
            &doubled,
            &index,
            &mut plan,
            &mut Solvers::new(1),
            &params(&problem, &index),
            &mut result,
        )
        .expect("search");

        // 0 -> 1 -> 2 -> 0 uses costs 2, 3 and 4.
        assert_eq!(result.objective, Some(2));
        let directed = doubled.map_tour_back(&result.tour).expect("map back");
        validate_tour(3, &directed).expect("valid tour");
    }
}
