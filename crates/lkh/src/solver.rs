use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    LkhResult, parameters::LkhParameters, problem::TsplibProblem, process::LkhProcess,
    tour::TsplibTour,
};

const DEFAULT_TOUR_FILE: &str = "problem.tour";
const DEFAULT_PARAMS_FILE: &str = "problem.par";

/// Writes a problem and its parameters into a work directory, runs LKH there
/// and reads back the tour.
#[derive(Clone, Debug)]
pub struct LkhSolver {
    workdir: PathBuf,
    problem: TsplibProblem,
    params: LkhParameters,
}

impl LkhSolver {
    pub fn new(problem: TsplibProblem, mut params: LkhParameters) -> Self {
        let workdir = derive_workdir(params.problem_file());

        if params.output_tour_file.is_none() {
            params.output_tour_file = Some(workdir.join(DEFAULT_TOUR_FILE));
        }

        Self {
            workdir,
            problem,
            params,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn params(&self) -> &LkhParameters {
        &self.params
    }

    pub fn run_with_exe(&self, exe_path: impl Into<PathBuf>) -> LkhResult<TsplibTour> {
        self.run(&LkhProcess::new(exe_path))
    }

    pub fn run(&self, process: &LkhProcess) -> LkhResult<TsplibTour> {
        let param_file = self.workdir.join(DEFAULT_PARAMS_FILE);
        let tour_file = self
            .params
            .output_tour_file
            .clone()
            .unwrap_or_else(|| self.workdir.join(DEFAULT_TOUR_FILE));

        fs::create_dir_all(&self.workdir)?;

        self.problem.write_to_file(self.params.problem_file())?;
        self.params.write_to_file(&param_file)?;

        process.run(&param_file, format!("LKH run on {}", self.problem.name))?;
        TsplibTour::from_file(tour_file)
    }
}

fn derive_workdir(problem_file: &Path) -> PathBuf {
    match problem_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
