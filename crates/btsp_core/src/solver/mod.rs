//! Hamiltonian-cycle solvers behind one contract.
//!
//! The searches only ever ask "give me a short tour on this matrix". Which
//! solver answers is chosen per plan step through [`SolverParams`].

pub mod config;
mod exact;
mod insertion;
mod lin_kernighan;
mod local_search;

pub use config::{KickType, LkParams, RaiParams};
pub use exact::MAX_EXACT_NODES;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    time::{Duration, Instant},
};

use btsp_derive::CliValue;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Result,
    problem::{Cost, Problem, tour_length, validate_tour},
};
use lin_kernighan::LkhRunner;

/// Problems this small go to the exact solver whatever the step asked for.
const TRIVIAL_NODES: usize = 3;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, CliValue)]
#[cli_value(option = "solver")]
pub enum SolverKind {
    Exact,
    LinKernighan,
    #[cli(name = "rai")]
    Insertion,
}

impl SolverKind {
    pub const ALL: [SolverKind; 3] = [Self::Exact, Self::LinKernighan, Self::Insertion];
}

#[derive(Clone, Debug, PartialEq)]
pub enum SolverParams {
    Exact,
    LinKernighan(LkParams),
    Insertion(RaiParams),
}

impl SolverParams {
    pub fn kind(&self) -> SolverKind {
        match self {
            Self::Exact => SolverKind::Exact,
            Self::LinKernighan(_) => SolverKind::LinKernighan,
            Self::Insertion(_) => SolverKind::Insertion,
        }
    }
}

impl Display for SolverParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Outcome of one solver call. `length` is measured on the problem the
/// solver was given.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TourResult {
    pub found: bool,
    pub length: Cost,
    pub tour: Vec<usize>,
    pub elapsed: Duration,
}

pub trait TourSolver {
    /// Returns a tour on `problem`. An `Err` is a hard failure, never a
    /// "no tour" answer.
    fn solve(&mut self, problem: &dyn Problem, params: &SolverParams) -> Result<TourResult>;
}

/// The built-in solvers. Owns the random stream the heuristics draw from.
pub struct Solvers {
    rng: StdRng,
    lkh: Option<LkhRunner>,
}

impl Solvers {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            lkh: None,
        }
    }

    /// Hands Lin-Kernighan steps to an LKH executable instead of the
    /// in-process local search.
    pub fn with_lkh(mut self, executable: &Path, work_dir: &Path) -> Self {
        self.lkh = Some(LkhRunner::new(executable, work_dir));
        self
    }

    pub fn lkh_work_dir(&self) -> Option<&Path> {
        self.lkh.as_ref().map(LkhRunner::work_dir)
    }

    fn tour(&mut self, problem: &dyn Problem, params: &SolverParams) -> Result<Vec<usize>> {
        if problem.size() <= TRIVIAL_NODES {
            return exact::solve(problem);
        }

        match params {
            SolverParams::Exact => exact::solve(problem),
            SolverParams::LinKernighan(lk) => match &self.lkh {
                Some(runner) => {
                    let seed = self.rng.random::<u64>();
                    runner.solve(problem, lk, seed)
                }
                None => Ok(lin_kernighan::solve_in_process(problem, lk, &mut self.rng)),
            },
            SolverParams::Insertion(rai) => Ok(insertion::solve(problem, rai, &mut self.rng)),
        }
    }
}

impl TourSolver for Solvers {
    fn solve(&mut self, problem: &dyn Problem, params: &SolverParams) -> Result<TourResult> {
        let started = Instant::now();
        let tour = self.tour(problem, params)?;
        validate_tour(problem.size(), &tour)?;

        let result = TourResult {
            found: true,
            length: tour_length(problem, &tour),
            tour,
            elapsed: started.elapsed(),
        };
        log::trace!(
            "solver.solve: kind={} n={} length={} elapsed={:.3}s",
            params.kind(),
            problem.size(),
            result.length,
            result.elapsed.as_secs_f64()
        );
        Ok(result)
    }
}
