//! One feasibility question: is there a tour whose edges fit a window?

use crate::{
    Result,
    cost_index::CostIndex,
    plan::SolvePlan,
    problem::Problem,
    result::{FoundTour, SolverTally},
    solver::TourSolver,
    window::Window,
};

/// Answer of [`feasible`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Verdict {
    pub feasible: bool,
    /// The feasible tour, or with upper-bound tracking the best infeasible
    /// one, measured on the checked problem.
    pub tour: Option<FoundTour>,
}

/// Runs the plan steps in order until an attempt passes the step's
/// feasibility test. Every solver call is tallied, also when a later call
/// fails.
pub fn feasible(
    problem: &dyn Problem,
    index: &CostIndex,
    plan: &mut SolvePlan,
    solver: &mut dyn TourSolver,
    window: Window,
    tally: &mut SolverTally,
) -> Result<Verdict> {
    let mut verdict = Verdict::default();
    let step_count = plan.steps().len();

    for (s, step) in plan.steps_mut().iter_mut().enumerate() {
        for attempt in 1..=step.attempts {
            step.transform.initialize(index)?;
            let derived = step.transform.apply(problem, window);
            let result = solver.solve(&derived, &step.solver)?;
            tally.record(step.solver.kind(), result.elapsed);

            let passed = result.found
                && step
                    .transform
                    .feasible(problem, window, result.length, &result.tour);
            log::debug!(
                "feasible.attempt: step={}/{step_count} attempt={attempt}/{} solver={} transform={} window={window} length={} feasible={passed}",
                s + 1,
                step.attempts,
                step.solver,
                step.transform,
                result.length
            );

            if passed {
                verdict.feasible = true;
                verdict.tour = Some(FoundTour::measure(problem, result.tour)?);
                return Ok(verdict);
            }

            if step.upper_bound_update
                && result.found
                && step.transform.accepts_as_upper_bound(problem, &result.tour)
            {
                let found = FoundTour::measure(problem, result.tour)?;
                if verdict
                    .tour
                    .as_ref()
                    .is_none_or(|best| found.max_cost < best.max_cost)
                {
                    log::debug!(
                        "feasible.upper_bound: bottleneck={} length={}",
                        found.max_cost,
                        found.length
                    );
                    verdict.tour = Some(found);
                }
            }
        }
    }

    Ok(verdict)
}
