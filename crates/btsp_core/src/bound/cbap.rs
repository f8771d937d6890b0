//! Constrained bottleneck assignment.
//!
//! A tour of length at most `max_length` is also an assignment of that
//! length, so the smallest threshold whose cheapest admitted assignment fits
//! the budget bounds the constrained bottleneck from below. Each threshold is
//! answered by a shortest augmenting path assignment solver with dual
//! potentials.

use std::time::Instant;

use super::{BoundResult, threshold_search};
use crate::{
    Error, Result,
    cost_index::CostIndex,
    problem::{Cost, Problem},
    window::Window,
};

const NONE: usize = usize::MAX;

#[btsp_derive::timer("cbap.solve")]
pub fn solve(problem: &dyn Problem, index: &CostIndex, max_length: Cost) -> Result<BoundResult> {
    let started = Instant::now();
    match assignment_length(problem, Window::ceiling(index.max())) {
        None => {
            return Err(Error::invalid_input("No assignment avoids the diagonal"));
        }
        Some(cheapest) if cheapest > max_length => {
            return Err(Error::invalid_input(format!(
                "Max length {max_length} is infeasible: the cheapest assignment has length {cheapest}"
            )));
        }
        Some(_) => {}
    }

    let objective = threshold_search(index, |window| {
        assignment_length(problem, window).is_some_and(|length| length <= max_length)
    });
    log::debug!(
        "cbap.solve: n={} max_length={max_length} objective={objective}",
        problem.size()
    );

    Ok(BoundResult {
        objective,
        elapsed: started.elapsed(),
    })
}

/// Length of the cheapest assignment of every row `i` to a distinct column
/// `j != i` through admitted edges. `None` when there is no such assignment.
pub fn assignment_length(problem: &dyn Problem, window: Window) -> Option<Cost> {
    let n = problem.size();
    let admitted = |i: usize, j: usize| {
        let cost = problem.cost(i, j);
        (i != j && window.admits(cost)).then_some(cost)
    };

    // Column `n` is the virtual column each phase starts from.
    let mut row_potential = vec![0; n];
    let mut col_potential = vec![0; n + 1];
    let mut col_row = vec![NONE; n + 1];
    let mut via = vec![NONE; n + 1];

    for row in 0..n {
        col_row[n] = row;
        let mut col = n;
        let mut slack: Vec<Option<Cost>> = vec![None; n + 1];
        let mut done = vec![false; n + 1];

        loop {
            done[col] = true;
            let current = col_row[col];
            let mut step: Option<(Cost, usize)> = None;
            for j in 0..n {
                if done[j] {
                    continue;
                }
                if let Some(cost) = admitted(current, j) {
                    let reduced = cost - row_potential[current] - col_potential[j];
                    if slack[j].is_none_or(|s| reduced < s) {
                        slack[j] = Some(reduced);
                        via[j] = col;
                    }
                }
                if let Some(s) = slack[j]
                    && step.is_none_or(|(best, _)| s < best)
                {
                    step = Some((s, j));
                }
            }

            // No admitted edge leads to an unlabelled column.
            let (delta, next) = step?;
            for j in 0..=n {
                if done[j] {
                    row_potential[col_row[j]] += delta;
                    col_potential[j] -= delta;
                } else if let Some(s) = slack[j].as_mut() {
                    *s -= delta;
                }
            }

            col = next;
            if col_row[col] == NONE {
                break;
            }
        }

        while col != n {
            let previous = via[col];
            col_row[col] = col_row[previous];
            col = previous;
        }
    }

    Some((0..n).map(|j| problem.cost(col_row[j], j)).sum())
}

#[cfg(test)]
mod tests {
    use super::{assignment_length, solve};
    use crate::{
        bound::bap, cost_index::CostIndex, fixtures::five_node, problem::MatrixProblem,
        window::Window,
    };

    /// The cycle 0-1-2-3 assigns at bottleneck 3 for length 12; the swaps
    /// {0,2} and {1,3} need a 5 but only cost 8 in total.
    fn budget_sensitive() -> MatrixProblem {
        MatrixProblem::from_rows(vec![
            vec![0, 3, 5, 9],
            vec![9, 0, 3, 1],
            vec![1, 9, 0, 3],
            vec![3, 1, 9, 0],
        ])
        .expect("valid matrix")
    }

    #[test]
    fn cheapest_assignment_under_each_threshold() {
        let problem = budget_sensitive();
        assert_eq!(assignment_length(&problem, Window::ceiling(1)), None);
        assert_eq!(assignment_length(&problem, Window::ceiling(3)), Some(12));
        assert_eq!(assignment_length(&problem, Window::ceiling(5)), Some(8));
        assert_eq!(assignment_length(&problem, Window::ceiling(9)), Some(8));
    }

    #[test]
    fn assignment_avoids_the_diagonal_and_reassigns_rows() {
        let problem = MatrixProblem::from_rows(vec![
            vec![0, 4, 1],
            vec![2, 0, 6],
            vec![5, 3, 0],
        ])
        .expect("valid matrix");
        assert_eq!(assignment_length(&problem, Window::ceiling(6)), Some(1 + 2 + 3));
        assert_eq!(assignment_length(&problem, Window::ceiling(2)), None);
    }

    #[test]
    fn budget_moves_the_threshold() {
        let problem = budget_sensitive();
        let index = CostIndex::build(&problem, false).expect("index");

        assert_eq!(solve(&problem, &index, 12).expect("loose").objective, 3);
        assert_eq!(solve(&problem, &index, 10).expect("tight").objective, 5);
        assert_eq!(bap::solve(&problem, &index).expect("bap").objective, 3);

        let err = solve(&problem, &index, 7).expect_err("below every assignment");
        assert!(err.to_string().contains("length 8"));
    }

    #[test]
    fn loose_budget_on_a_tour_problem_stays_below_the_bottleneck() {
        let problem = five_node();
        let index = CostIndex::build(&problem, false).expect("index");
        let bound = solve(&problem, &index, 100).expect("cbap");
        assert!(bound.objective <= 4);
    }
}
