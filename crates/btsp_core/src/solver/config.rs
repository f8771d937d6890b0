use std::{path::Path, time::Duration};

use btsp_derive::CliValue;
use lkh::parameters::{LkhParameters, YesNo};

use crate::problem::Cost;

const MIN_STALL_COUNT: usize = 10;
const MAX_STALL_COUNT: usize = 100_000;
const MIN_KICKS: usize = 1;
const MAX_KICKS: usize = 500;
const LKH_TRACE_LEVEL: usize = 0;
/// LKH's KICK_TYPE value for a double-bridge (4-swap) kick. Zero selects
/// its random walk kicks.
const LKH_DOUBLE_BRIDGE: usize = 4;
const LKH_WALK: usize = 0;

/// Perturbation applied between local-search descents.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, CliValue)]
#[cli_value(option = "kick-type")]
pub enum KickType {
    /// Reverse a short random segment.
    #[default]
    Walk,
    /// Cut the tour in four and reconnect the middle pieces swapped.
    DoubleBridge,
}

/// Parameters of the Lin-Kernighan style solver.
#[derive(Clone, Debug, PartialEq)]
pub struct LkParams {
    /// Extra runs from fresh random tours.
    pub random_restarts: usize,
    /// Kicks without improvement before a run gives up.
    pub stall_count: usize,
    /// Kicks per run.
    pub kicks: usize,
    pub kick_type: KickType,
    pub time_bound: Option<Duration>,
    /// Stop as soon as a tour this short (or shorter) is found.
    pub length_bound: Option<Cost>,
}

impl LkParams {
    /// Defaults for an `n`-node problem.
    pub fn for_size(n: usize) -> Self {
        Self {
            random_restarts: 0,
            stall_count: n.clamp(MIN_STALL_COUNT, MAX_STALL_COUNT),
            kicks: (n / 2).clamp(MIN_KICKS, MAX_KICKS),
            kick_type: KickType::default(),
            time_bound: None,
            length_bound: None,
        }
    }

    pub fn with_length_bound(mut self, length_bound: Cost) -> Self {
        self.length_bound = Some(length_bound);
        self
    }

    /// LKH parameter file for one run on a problem whose costs were shifted
    /// up by `shift` per edge.
    pub(crate) fn lkh_parameters(
        &self,
        problem_file: &Path,
        size: usize,
        shift: Cost,
        seed: u64,
    ) -> LkhParameters {
        let kick_type = match self.kick_type {
            KickType::Walk => LKH_WALK,
            KickType::DoubleBridge => LKH_DOUBLE_BRIDGE,
        };

        let mut params = LkhParameters::new(problem_file)
            .with_runs(self.random_restarts + 1)
            .with_max_trials(self.stall_count)
            .with_kicks(self.kicks)
            .with_kick_type(kick_type)
            .with_seed(seed)
            .with_trace_level(LKH_TRACE_LEVEL);

        if let Some(time_bound) = self.time_bound {
            params = params.with_time_limit(time_bound.as_secs_f64());
        }
        if let Some(length_bound) = self.length_bound {
            params = params
                .with_optimum(length_bound + shift * size as Cost)
                .with_stop_at_optimum(YesNo::Yes);
        }
        params
    }
}

/// Parameters of the randomized arbitrary insertion solver.
#[derive(Clone, Debug, PartialEq)]
pub struct RaiParams {
    /// Remove-and-reinsert rounds after the initial construction.
    pub iterations: usize,
    /// Score insertions by the bottleneck instead of the length.
    pub solve_btsp: bool,
}

impl RaiParams {
    /// `n * n` iterations scored by length.
    pub fn for_size(n: usize) -> Self {
        Self {
            iterations: n * n,
            solve_btsp: false,
        }
    }
}
