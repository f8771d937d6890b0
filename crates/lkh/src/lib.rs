//! `lkh` provides a typed Rust API for reading and writing TSPLIB files,
//! writing LKH parameter files, running LKH and parsing its tour output.
//!
//! It is used by the bottleneck TSP heuristics to:
//! - load TSPLIB problems (coordinates or explicit matrices),
//! - hand transformed cost matrices to LKH as `EXPLICIT` / `FULL_MATRIX` files,
//! - invoke LKH as a subprocess,
//! - parse returned tours into zero-based `Vec<usize>` orderings.
//!
//! # Quickstart
//!
//! ```no_run
//! use lkh::{
//!     parameters::LkhParameters,
//!     problem::TsplibProblem,
//!     solver::LkhSolver,
//! };
//!
//! fn main() -> lkh::LkhResult<()> {
//!     let problem = TsplibProblem::from_full_matrix(
//!         "triangle",
//!         vec![vec![0, 3, 4], vec![3, 0, 5], vec![4, 5, 0]],
//!         true,
//!     );
//!
//!     let params = LkhParameters::new("work/problem.tsp").with_runs(1usize);
//!     let solver = LkhSolver::new(problem, params);
//!     let tour = solver.run_with_exe("/usr/local/bin/LKH")?;
//!     let order = tour.zero_based_tour()?;
//!     println!("{order:?}");
//!     Ok(())
//! }
//! ```

pub mod parameters;
pub mod problem;
pub mod process;
pub mod solver;
pub mod tour;

mod error;
mod spec_writer;
mod tsplib_text;

pub use error::{LkhError, LkhResult};
