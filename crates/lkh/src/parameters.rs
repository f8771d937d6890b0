//! LKH parameter-file model, limited to the keys the bottleneck searches
//! drive: run counts, kicks, time limits and the stop-at-length bound.

use std::{
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use crate::{LkhResult, spec_writer::SpecWriter};
use lkh_derive::{LkhKeyword, WithMethods};

/// Yes/No wrapper for LKH parameters expressed as `[ YES | NO ]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, LkhKeyword)]
pub enum YesNo {
    Yes,
    No,
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

/// LKH parameter file.
///
/// Field docs paraphrase the LKH parameter guide.
#[derive(Clone, Debug, WithMethods)]
pub struct LkhParameters {
    /// Name of the problem file. Always written first.
    #[with(skip)]
    pub problem_file: PathBuf,

    /// Free-form `COMMENT` lines.
    pub comment_lines: Vec<String>,
    /// Terminate the file with `EOF`.
    pub emit_eof: bool,
    /// Number of times to kick a tour found by Lin-Kernighan.
    pub kicks: Option<usize>,
    /// Value of K for a random K-swap kick.
    pub kick_type: Option<usize>,
    /// Maximum number of trials in each run.
    pub max_trials: Option<usize>,
    /// Sequential move type used in local search.
    pub move_type: Option<usize>,
    /// Known optimal tour length; with `STOP_AT_OPTIMUM` it acts as a length bound.
    pub optimum: Option<i64>,
    /// File the best tour is written to.
    pub output_tour_file: Option<PathBuf>,
    /// Internal precision of transformed distances.
    pub precision: Option<usize>,
    /// Total number of runs.
    pub runs: Option<usize>,
    /// Initial seed for random number generation.
    pub seed: Option<u64>,
    /// Stop a run when the tour length reaches `OPTIMUM`.
    pub stop_at_optimum: Option<YesNo>,
    /// Time limit in seconds for each run.
    pub time_limit: Option<f64>,
    /// Level of detail of LKH's own output.
    pub trace_level: Option<usize>,
}

impl Display for LkhParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut writer = SpecWriter::new(f);

        writer.kv_eq("PROBLEM_FILE", self.problem_file.display())?;

        // Remaining keys stay alphabetical for stable output.
        for comment in &self.comment_lines {
            writer.line(format!("COMMENT {comment}"))?;
        }
        writer.opt_kv_eq("KICKS", self.kicks)?;
        writer.opt_kv_eq("KICK_TYPE", self.kick_type)?;
        writer.opt_kv_eq("MAX_TRIALS", self.max_trials)?;
        writer.opt_kv_eq("MOVE_TYPE", self.move_type)?;
        writer.opt_kv_eq("OPTIMUM", self.optimum)?;
        writer.opt_path_eq("OUTPUT_TOUR_FILE", self.output_tour_file.as_ref())?;
        writer.opt_kv_eq("PRECISION", self.precision)?;
        writer.opt_kv_eq("RUNS", self.runs)?;
        writer.opt_kv_eq("SEED", self.seed)?;
        writer.opt_kv_eq("STOP_AT_OPTIMUM", self.stop_at_optimum)?;
        writer.opt_kv_eq("TIME_LIMIT", self.time_limit)?;
        writer.opt_kv_eq("TRACE_LEVEL", self.trace_level)?;

        if self.emit_eof {
            writer.line("EOF")?;
        }

        Ok(())
    }
}

impl LkhParameters {
    pub fn new(problem_file: impl Into<PathBuf>) -> Self {
        Self {
            problem_file: problem_file.into(),
            comment_lines: Vec::new(),
            emit_eof: false,
            kicks: None,
            kick_type: None,
            max_trials: None,
            move_type: None,
            optimum: None,
            output_tour_file: None,
            precision: None,
            runs: None,
            seed: None,
            stop_at_optimum: None,
            time_limit: None,
            trace_level: None,
        }
    }

    pub fn problem_file(&self) -> &Path {
        &self.problem_file
    }

    pub fn write_to_file(&self, path: &Path) -> LkhResult<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}
