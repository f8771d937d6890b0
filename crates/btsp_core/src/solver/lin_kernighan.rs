use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use lkh::{problem::TsplibProblem, solver::LkhSolver};
use rand::{rngs::StdRng, seq::SliceRandom};

use crate::{
    Result,
    problem::{Cost, Problem, validate_tour},
    solver::{
        config::LkParams,
        local_search::{LocalSearch, kick},
    },
};

const PROBLEM_NAME: &str = "step";
const PROBLEM_FILE: &str = "step.tsp";

/// Runs LKH as a subprocess inside a work directory.
#[derive(Clone, Debug)]
pub(crate) struct LkhRunner {
    executable: PathBuf,
    work_dir: PathBuf,
}

impl LkhRunner {
    pub(crate) fn new(executable: &Path, work_dir: &Path) -> Self {
        Self {
            executable: executable.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub(crate) fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// LKH wants non-negative weights, so fixed edges are lifted by a common
    /// shift before the matrix is written.
    pub(crate) fn solve(
        &self,
        problem: &dyn Problem,
        params: &LkParams,
        seed: u64,
    ) -> Result<Vec<usize>> {
        let n = problem.size();
        let shift = lkh_shift(problem);
        let rows = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 0 } else { problem.cost(i, j) + shift })
                    .collect()
            })
            .collect();

        let tsplib = TsplibProblem::from_full_matrix(PROBLEM_NAME, rows, problem.is_symmetric());
        let lkh_params = params.lkh_parameters(&self.work_dir.join(PROBLEM_FILE), n, shift, seed);

        log::trace!(
            "lkh.run: n={n} shift={shift} dir={}",
            self.work_dir.display()
        );
        let tour = LkhSolver::new(tsplib, lkh_params)
            .run_with_exe(self.executable.clone())?
            .zero_based_tour()?;
        validate_tour(n, &tour)?;
        Ok(tour)
    }
}

/// Amount that lifts the cheapest off-diagonal cost to zero.
fn lkh_shift(problem: &dyn Problem) -> Cost {
    let n = problem.size();
    let floor = (0..n)
        .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
        .map(|(i, j)| problem.cost(i, j))
        .min()
        .unwrap_or(0);
    (-floor).max(0)
}

/// Chained local search: descend, kick, keep the kicked tour when it is
/// shorter, and start over from a fresh random tour for each restart.
pub(crate) fn solve_in_process(
    problem: &dyn Problem,
    params: &LkParams,
    rng: &mut StdRng,
) -> Vec<usize> {
    let n = problem.size();
    let deadline = params.time_bound.map(|bound| Instant::now() + bound);
    let search = LocalSearch::new(problem, deadline);
    let reached = |length: Cost| params.length_bound.is_some_and(|bound| length <= bound);

    let mut best: Option<(Cost, Vec<usize>)> = None;
    for run in 0..=params.random_restarts {
        let mut tour: Vec<usize> = (0..n).collect();
        tour.shuffle(rng);
        let mut length = search.descend(&mut tour);

        let mut stalled = 0;
        for _ in 0..params.kicks {
            if reached(length) || stalled >= params.stall_count || search.expired() {
                break;
            }
            let mut candidate = kick(&tour, params.kick_type, rng);
            let candidate_length = search.descend(&mut candidate);
            if candidate_length < length {
                tour = candidate;
                length = candidate_length;
                stalled = 0;
            } else {
                stalled += 1;
            }
        }
        log::trace!("lk.run: run={} length={length}", run + 1);

        if best.as_ref().is_none_or(|(top, _)| length < *top) {
            best = Some((length, tour));
        }
        if reached(length) || search.expired() {
            break;
        }
    }

    best.map(|(_, tour)| tour).unwrap_or_else(|| (0..n).collect())
}
