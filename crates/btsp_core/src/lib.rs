//! Bottleneck TSP heuristics built on the enhanced binary search threshold
//! (EBST) search: a sorted distinct-cost domain is searched for the lowest
//! threshold at which a Hamiltonian-cycle solver, run on a transformed cost
//! matrix, still finds a tour within the threshold.
//! Constrained, asymmetric and balanced variants share the same engine.

pub mod balanced;
pub mod bound;
mod cleanup;
pub mod cost_index;
mod error;
pub mod feasible;
mod io;
pub mod logging;
pub mod plan;
pub mod problem;
pub mod result;
pub mod runner;
pub mod search;
pub mod solver;
pub mod transform;
pub mod window;

#[cfg(test)]
mod fixtures;

pub use cleanup::{WorkDir, remove_work_dir};
pub use error::{Error, Result};
pub use io::input::{LoadedProblem, from_tsplib, read_problem};
pub use io::options::{LogFormat, LogLevel, Mode, SolverOptions};
pub use io::report::{XmlReport, write_pretty, write_tour};
pub use runner::{Outcome, RunReport, TourOutcome, run};
