use std::{
    env,
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use btsp_derive::{CliOptions, CliValue, KvDisplay};
use log::LevelFilter;

use crate::{
    Error, Result,
    problem::Cost,
    solver::{KickType, LkParams, RaiParams},
    transform::ApplyMode,
};

const DEFAULT_BASIC_ATTEMPTS: usize = 3;
const DEFAULT_SHAKE_ATTEMPTS: usize = 1;

/// Everything one invocation needs, read once from argv.
#[derive(Clone, Debug, CliOptions, KvDisplay)]
pub struct SolverOptions {
    /// TSPLIB problem file.
    #[cli(long = "input")]
    pub input: String,
    #[cli(long = "mode", parse_with = "Mode::parse")]
    pub mode: Mode,
    /// LKH executable for the Lin-Kernighan steps. Empty runs the built-in
    /// local search instead.
    #[cli(long = "lkh-exe")]
    #[kv(fmt = "path")]
    pub lkh_exe: PathBuf,
    /// Scratch directory for LKH problem, parameter and tour files.
    #[cli(long = "work-dir")]
    #[kv(fmt = "path")]
    pub work_dir: PathBuf,
    /// Remove the work directory after the run.
    #[cli(long = "cleanup", flag)]
    pub cleanup: bool,
    /// Write an XML summary here.
    #[cli(long = "xml")]
    pub xml: String,
    /// Write the best tour here as a TSPLIB tour file.
    #[cli(long = "tour")]
    pub tour: String,
    #[cli(long = "restarts")]
    #[kv(fmt = "opt")]
    pub restarts: Option<usize>,
    #[cli(long = "stall-count")]
    #[kv(fmt = "opt")]
    pub stall_count: Option<usize>,
    #[cli(long = "kicks")]
    #[kv(fmt = "opt")]
    pub kicks: Option<usize>,
    #[cli(long = "kick-type", parse_with = "KickType::parse")]
    pub kick_type: KickType,
    /// Seconds per Lin-Kernighan call.
    #[cli(long = "time-bound")]
    #[kv(fmt = "opt")]
    pub time_bound: Option<f64>,
    #[cli(long = "basic-attempts")]
    pub basic_attempts: usize,
    #[cli(long = "shake-attempts")]
    pub shake_attempts: usize,
    #[cli(long = "shake-rand-min")]
    pub shake_rand_min: Cost,
    /// Defaults to `n * n + shake_rand_min`.
    #[cli(long = "shake-rand-max")]
    #[kv(fmt = "opt")]
    pub shake_rand_max: Option<Cost>,
    /// Cost of ruled-out edges. The default depends on the mode.
    #[cli(long = "infinity")]
    #[kv(fmt = "opt")]
    pub infinity: Option<Cost>,
    #[cli(long = "lower-bound")]
    #[kv(fmt = "opt")]
    pub lower_bound: Option<Cost>,
    #[cli(long = "upper-bound")]
    #[kv(fmt = "opt")]
    pub upper_bound: Option<Cost>,
    /// Tour length budget of the constrained search.
    #[cli(long = "max-length")]
    #[kv(fmt = "opt")]
    pub max_length: Option<Cost>,
    /// Re-check the final objective one unit lower with the exact solver.
    #[cli(long = "confirm", flag)]
    pub confirm: bool,
    /// Stop after the lower-bound check.
    #[cli(long = "suppress-ebst", flag)]
    pub suppress_ebst: bool,
    /// Materialize every transformed matrix instead of viewing the base.
    #[cli(long = "deep-copy", flag)]
    pub deep_copy: bool,
    /// Hash-backed cost rank lookup.
    #[cli(long = "hash", flag)]
    pub hash: bool,
    #[cli(long = "with-improvements", flag)]
    pub with_improvements: bool,
    /// Balanced searches report their lower bound only.
    #[cli(long = "lb-only", flag)]
    pub lb_only: bool,
    /// Defaults to `n * n`.
    #[cli(long = "rai-iterations")]
    #[kv(fmt = "opt")]
    pub rai_iterations: Option<usize>,
    /// Score insertions by bottleneck instead of length.
    #[cli(long = "rai-btsp", flag)]
    pub rai_btsp: bool,
    #[cli(long = "seed")]
    pub seed: u64,
    #[cli(long = "log-level", parse_with = "LogLevel::parse")]
    pub log_level: LogLevel,
    #[cli(long = "log-format", parse_with = "LogFormat::parse")]
    pub log_format: LogFormat,
    #[cli(long = "log-timestamp", flag)]
    pub log_timestamp: bool,
    /// Log file. Empty means stderr.
    #[cli(long = "log-output")]
    pub log_output: String,
}

/// What a run computes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "mode")]
pub enum Mode {
    /// Bottleneck tour; directed input is doubled first.
    Btsp,
    /// Bottleneck tour of a directed problem, shifted on its doubled form.
    Abtsp,
    /// Bottleneck tour of a directed problem by randomized insertion.
    AbtspRai,
    /// Bottleneck tour under a length budget.
    Cbtsp,
    /// Balanced tour by the double-threshold search.
    BaltspDt,
    /// Balanced tour by the iterative bottleneck search.
    BaltspIb,
    Bbssp,
    Bap,
    Bscssp,
    /// Assignment bound under `--max-length`.
    Cbap,
    /// Spanning tree bound under `--max-length`.
    Cbst,
    /// Print the distinct costs.
    Costs,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-level")]
pub enum LogLevel {
    Error,
    #[cli(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-format")]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            input: String::new(),
            mode: Mode::Btsp,
            lkh_exe: PathBuf::new(),
            work_dir: default_work_dir(),
            cleanup: true,
            xml: String::new(),
            tour: String::new(),
            restarts: None,
            stall_count: None,
            kicks: None,
            kick_type: KickType::default(),
            time_bound: None,
            basic_attempts: DEFAULT_BASIC_ATTEMPTS,
            shake_attempts: DEFAULT_SHAKE_ATTEMPTS,
            shake_rand_min: 0,
            shake_rand_max: None,
            infinity: None,
            lower_bound: None,
            upper_bound: None,
            max_length: None,
            confirm: false,
            suppress_ebst: false,
            deep_copy: false,
            hash: true,
            with_improvements: false,
            lb_only: false,
            rai_iterations: None,
            rai_btsp: false,
            seed: 0,
            log_level: LogLevel::Warn,
            log_format: LogFormat::Compact,
            log_timestamp: false,
            log_output: String::new(),
        }
    }
}

impl SolverOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse_from_iter(env::args().skip(1))
    }

    fn parse_from_iter<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        let mut args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_owned())
            .peekable();

        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                return Err(Error::invalid_input(Self::usage()));
            }

            let Some(raw_name) = arg.strip_prefix("--") else {
                return Err(Error::invalid_input(format!(
                    "Unexpected argument: {arg}\n\n{}",
                    Self::usage()
                )));
            };
            if raw_name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Invalid option name: {arg}\n\n{}",
                    Self::usage()
                )));
            }

            let (name, value) = Self::split_arg(raw_name, &mut args);
            if !options.apply_cli_option(&name, value)? {
                return Err(Error::invalid_input(format!(
                    "Unknown option: --{name}\n\n{}",
                    Self::usage()
                )));
            }
        }

        if options.input_path().is_none() {
            return Err(Error::invalid_input(format!(
                "Missing required option --input\n\n{}",
                Self::usage()
            )));
        }
        if let Some(seconds) = options.time_bound
            && !(seconds.is_finite() && seconds > 0.0)
        {
            return Err(Error::invalid_input(format!(
                "Invalid value for --time-bound: {seconds} (expected seconds > 0)"
            )));
        }
        Ok(options)
    }

    pub fn usage() -> &'static str {
        concat!(
            "Usage:\n",
            "  btsp --input <problem.tsp> [options]\n\n",
            "Options:\n",
            "  --mode <btsp|abtsp|abtsp-rai|cbtsp|baltsp-dt|baltsp-ib|bbssp|bap|bscssp|cbap|cbst|costs>\n",
            "  --lkh-exe <path>\n",
            "  --work-dir <path>\n",
            "  --cleanup[=<bool>] | --no-cleanup\n",
            "  --xml <path>\n",
            "  --tour <path>\n",
            "  --restarts <usize>\n",
            "  --stall-count <usize>\n",
            "  --kicks <usize>\n",
            "  --kick-type <walk|double-bridge>\n",
            "  --time-bound <seconds>\n",
            "  --basic-attempts <usize>\n",
            "  --shake-attempts <usize>\n",
            "  --shake-rand-min <i64>\n",
            "  --shake-rand-max <i64>\n",
            "  --infinity <i64>\n",
            "  --lower-bound <i64>\n",
            "  --upper-bound <i64>\n",
            "  --max-length <i64>\n",
            "  --confirm\n",
            "  --suppress-ebst\n",
            "  --deep-copy\n",
            "  --no-hash\n",
            "  --with-improvements\n",
            "  --lb-only\n",
            "  --rai-iterations <usize>\n",
            "  --rai-btsp\n",
            "  --seed <u64>\n",
            "  --log-level <error|warn|info|debug|trace|off>\n",
            "  --log-format <compact|pretty>\n",
            "  --log-timestamp[=<bool>] | --no-log-timestamp\n",
            "  --log-output <path>\n",
            "  --help\n",
            "\n",
            "Examples:\n",
            "  btsp --input pr76.tsp --confirm --tour pr76.tour\n",
            "  btsp --input ftv33.atsp --mode abtsp --lkh-exe ./LKH\n",
            "  btsp --input pr76.tsp --mode cbtsp --max-length 120000 --xml out.xml\n",
            "  btsp --input pr76.tsp --mode baltsp-dt --with-improvements --log-level=info\n",
        )
    }

    pub fn input_path(&self) -> Option<&Path> {
        non_empty_path(&self.input)
    }

    pub fn xml_path(&self) -> Option<&Path> {
        non_empty_path(&self.xml)
    }

    pub fn tour_path(&self) -> Option<&Path> {
        non_empty_path(&self.tour)
    }

    pub fn log_output_path(&self) -> Option<&Path> {
        non_empty_path(&self.log_output)
    }

    pub fn lkh_path(&self) -> Option<&Path> {
        (!self.lkh_exe.as_os_str().is_empty()).then_some(self.lkh_exe.as_path())
    }

    pub fn apply_mode(&self) -> ApplyMode {
        if self.deep_copy {
            ApplyMode::Deep
        } else {
            ApplyMode::Shallow
        }
    }

    /// Lin-Kernighan parameters for an `n`-node problem with the command
    /// line overrides applied.
    pub fn lk_params(&self, n: usize) -> LkParams {
        let mut params = LkParams::for_size(n);
        if let Some(restarts) = self.restarts {
            params.random_restarts = restarts;
        }
        if let Some(stall_count) = self.stall_count {
            params.stall_count = stall_count;
        }
        if let Some(kicks) = self.kicks {
            params.kicks = kicks;
        }
        params.kick_type = self.kick_type;
        params.time_bound = self.time_bound.map(Duration::from_secs_f64);
        params
    }

    pub fn rai_params(&self, n: usize) -> RaiParams {
        let mut params = RaiParams::for_size(n);
        if let Some(iterations) = self.rai_iterations {
            params.iterations = iterations;
        }
        params.solve_btsp = self.rai_btsp;
        params
    }
}

fn non_empty_path(raw: &str) -> Option<&Path> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        None
    } else {
        Some(Path::new(raw))
    }
}

fn default_work_dir() -> PathBuf {
    env::temp_dir().join(format!("btsp-{}", process::id()))
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use log::LevelFilter;

    use super::{LogFormat, LogLevel, Mode, SolverOptions};
    use crate::{Error, solver::KickType, transform::ApplyMode};

    #[test]
    fn parse_from_iter_applies_known_cli_options() {
        let options = SolverOptions::parse_from_iter([
            "--input=pr76.tsp",
            "--mode",
            "baltsp-dt",
            "--restarts=2",
            "--stall-count=40",
            "--kicks=9",
            "--kick-type=double-bridge",
            "--time-bound=1.5",
            "--basic-attempts=5",
            "--shake-attempts=0",
            "--shake-rand-min=10",
            "--shake-rand-max=900",
            "--infinity=100000",
            "--lower-bound=12",
            "--upper-bound=80",
            "--max-length=4000",
            "--seed=42",
            "--xml=out.xml",
            "--tour=out.tour",
            "--log-level=debug",
            "--log-format=pretty",
        ])
        .expect("parse options");

        assert_eq!(options.input_path(), Some(Path::new("pr76.tsp")));
        assert_eq!(options.mode, Mode::BaltspDt);
        assert_eq!(options.restarts, Some(2));
        assert_eq!(options.stall_count, Some(40));
        assert_eq!(options.kicks, Some(9));
        assert_eq!(options.kick_type, KickType::DoubleBridge);
        assert_eq!(options.time_bound, Some(1.5));
        assert_eq!(options.basic_attempts, 5);
        assert_eq!(options.shake_attempts, 0);
        assert_eq!(options.shake_rand_min, 10);
        assert_eq!(options.shake_rand_max, Some(900));
        assert_eq!(options.infinity, Some(100_000));
        assert_eq!(options.lower_bound, Some(12));
        assert_eq!(options.upper_bound, Some(80));
        assert_eq!(options.max_length, Some(4000));
        assert_eq!(options.seed, 42);
        assert_eq!(options.xml_path(), Some(Path::new("out.xml")));
        assert_eq!(options.tour_path(), Some(Path::new("out.tour")));
        assert_eq!(options.log_level, LogLevel::Debug);
        assert_eq!(options.log_format, LogFormat::Pretty);
    }

    #[test]
    fn flags_take_optional_values_and_negations() {
        let options = SolverOptions::parse_from_iter([
            "--input=a.tsp",
            "--confirm",
            "--suppress-ebst=true",
            "--deep-copy",
            "--no-hash",
            "--no-cleanup",
            "--with-improvements",
            "--lb-only=off",
            "--rai-btsp",
        ])
        .expect("parse options");

        assert!(options.confirm);
        assert!(options.suppress_ebst);
        assert!(!options.hash);
        assert!(!options.cleanup);
        assert!(options.with_improvements);
        assert!(!options.lb_only);
        assert!(options.rai_btsp);
        assert_eq!(options.apply_mode(), ApplyMode::Deep);
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let options = SolverOptions::default();
        assert_eq!(options.mode, Mode::Btsp);
        assert_eq!(options.basic_attempts, 3);
        assert_eq!(options.shake_attempts, 1);
        assert_eq!(options.shake_rand_min, 0);
        assert!(options.hash);
        assert!(options.cleanup);
        assert!(options.lkh_path().is_none());
        assert_eq!(options.apply_mode(), ApplyMode::Shallow);
    }

    #[test]
    fn constrained_bound_modes_parse() {
        for (text, mode) in [("cbap", Mode::Cbap), ("cbst", Mode::Cbst)] {
            let options = SolverOptions::parse_from_iter([
                "--input=a.tsp",
                "--mode",
                text,
                "--max-length=90",
            ])
            .expect("parse options");
            assert_eq!(options.mode, mode);
            assert_eq!(options.mode.to_string(), text);
            assert_eq!(options.max_length, Some(90));
        }
    }

    #[test]
    fn input_is_required() {
        let err = SolverOptions::parse_from_iter(["--mode=bap"]).expect_err("no input");
        assert!(err.to_string().contains("Missing required option --input"));
    }

    #[test]
    fn rejects_unknown_options_and_positionals() {
        let err = SolverOptions::parse_from_iter(["--input=a.tsp", "--unknown-opt=1"])
            .expect_err("unknown option");
        assert!(err.to_string().contains("Unknown option: --unknown-opt"));

        let err = SolverOptions::parse_from_iter(["a.tsp"]).expect_err("positional");
        assert!(err.to_string().contains("Unexpected argument: a.tsp"));
    }

    #[test]
    fn rejects_bad_values() {
        let err = SolverOptions::parse_from_iter(["--input=a.tsp", "--mode=tsp"])
            .expect_err("bad mode");
        assert!(err.to_string().contains("expected btsp|abtsp|abtsp-rai"));

        let err = SolverOptions::parse_from_iter(["--input=a.tsp", "--infinity=lots"])
            .expect_err("bad number");
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = SolverOptions::parse_from_iter(["--input=a.tsp", "--time-bound=0"])
            .expect_err("zero time bound");
        assert!(err.to_string().contains("--time-bound"));

        let err = SolverOptions::parse_from_iter(["--input=a.tsp", "--no-confirm=1"])
            .expect_err("negation with value");
        assert!(err.to_string().contains("does not take a value"));
    }

    #[test]
    fn help_returns_usage_error() {
        let err = SolverOptions::parse_from_iter(["--help"]).expect_err("help");
        assert!(err.to_string().contains("Usage:"));
    }

    #[test]
    fn lk_params_apply_overrides() {
        let options = SolverOptions {
            restarts: Some(3),
            kicks: Some(7),
            time_bound: Some(0.25),
            kick_type: KickType::DoubleBridge,
            ..SolverOptions::default()
        };
        let params = options.lk_params(100);

        assert_eq!(params.random_restarts, 3);
        assert_eq!(params.kicks, 7);
        assert_eq!(params.stall_count, 100);
        assert_eq!(params.kick_type, KickType::DoubleBridge);
        assert_eq!(params.time_bound, Some(Duration::from_millis(250)));
        assert_eq!(params.length_bound, None);
    }

    #[test]
    fn rai_params_default_to_n_squared() {
        let options = SolverOptions::default();
        assert_eq!(options.rai_params(12).iterations, 144);

        let options = SolverOptions {
            rai_iterations: Some(5),
            rai_btsp: true,
            ..SolverOptions::default()
        };
        let params = options.rai_params(12);
        assert_eq!(params.iterations, 5);
        assert!(params.solve_btsp);
    }

    #[test]
    fn paths_treat_empty_and_dash_as_unset() {
        let options = SolverOptions {
            xml: "-".to_string(),
            log_output: " ".to_string(),
            ..SolverOptions::default()
        };
        assert!(options.xml_path().is_none());
        assert!(options.tour_path().is_none());
        assert!(options.log_output_path().is_none());
    }

    #[test]
    fn log_level_maps_to_expected_filter() {
        assert_eq!(LogLevel::Error.to_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Warn.to_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_filter(), LevelFilter::Trace);
        assert_eq!(LogLevel::Off.to_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::parse("warning").expect("alias"), LogLevel::Warn);
    }

    #[test]
    fn options_display_as_key_values() {
        let text = SolverOptions::default().to_string();
        assert!(text.contains("mode"));
        assert!(text.contains("= btsp"));
        assert!(text.contains("infinity"));
    }
}
