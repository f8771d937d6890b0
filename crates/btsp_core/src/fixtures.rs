//! Small problems and a scripted solver shared by the unit tests.

use std::{collections::VecDeque, time::Duration};

use crate::{
    Error, Result,
    problem::{Cost, MatrixProblem, Problem, tour_length},
    solver::{SolverParams, TourResult, TourSolver},
};

fn symmetric(n: usize, edges: &[(usize, usize, Cost)]) -> MatrixProblem {
    let mut rows = vec![vec![0; n]; n];
    for &(u, v, c) in edges {
        rows[u][v] = c;
        rows[v][u] = c;
    }
    MatrixProblem::from_rows(rows).expect("valid matrix")
}

/// K_{2,3} on costs 1..3 plus heavier chords. BBSSP bound 3, optimal
/// bottleneck 4 (tour 0-2-3-1-4).
pub(crate) fn five_node() -> MatrixProblem {
    symmetric(
        5,
        &[
            (0, 2, 1),
            (0, 3, 2),
            (0, 4, 3),
            (1, 2, 1),
            (1, 3, 2),
            (1, 4, 3),
            (2, 3, 4),
            (0, 1, 8),
            (2, 4, 9),
            (3, 4, 10),
        ],
    )
}

/// Directed 3-node problem with arcs in both directions.
pub(crate) fn directed_three() -> MatrixProblem {
    MatrixProblem::from_rows(vec![vec![0, 2, 9], vec![7, 0, 3], vec![4, 8, 0]])
        .expect("valid matrix")
}

/// `n` points on a ring; consecutive ring edges are the cheap ones.
pub(crate) fn ring(n: usize) -> MatrixProblem {
    MatrixProblem::from_fn(n, true, |i, j| {
        if i == j {
            return 0;
        }
        let gap = i.abs_diff(j).min(n - i.abs_diff(j)) as Cost;
        gap * 10 + ((i + j) % 3) as Cost
    })
}

/// Hands out canned tours in order and counts the calls. Errors once the
/// script runs dry.
pub(crate) struct Scripted {
    tours: VecDeque<Vec<usize>>,
    pub(crate) calls: usize,
}

impl Scripted {
    pub(crate) fn new(tours: Vec<Vec<usize>>) -> Self {
        Self {
            tours: tours.into(),
            calls: 0,
        }
    }
}

impl TourSolver for Scripted {
    fn solve(&mut self, problem: &dyn Problem, _params: &SolverParams) -> Result<TourResult> {
        self.calls += 1;
        let tour = self
            .tours
            .pop_front()
            .ok_or_else(|| Error::other("script ran out of tours"))?;
        Ok(TourResult {
            found: true,
            length: tour_length(problem, &tour),
            tour,
            elapsed: Duration::from_millis(10),
        })
    }
}
