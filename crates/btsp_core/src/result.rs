//! Search outcome accumulators.

use std::{ops::AddAssign, time::Duration};

use btsp_derive::KvDisplay;

use crate::{
    Error, Result,
    problem::{Cost, Problem, tour_cost_range, tour_length},
    solver::SolverKind,
};

/// Calls made to one solver kind and the time they took.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolverStats {
    pub attempts: usize,
    pub total_time: Duration,
}

impl SolverStats {
    pub fn average_time(&self) -> Duration {
        if self.attempts == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.attempts as u32
    }
}

impl AddAssign for SolverStats {
    fn add_assign(&mut self, other: Self) {
        self.attempts += other.attempts;
        self.total_time += other.total_time;
    }
}

/// Per-kind [`SolverStats`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolverTally {
    exact: SolverStats,
    lin_kernighan: SolverStats,
    insertion: SolverStats,
}

impl SolverTally {
    pub fn get(&self, kind: SolverKind) -> SolverStats {
        match kind {
            SolverKind::Exact => self.exact,
            SolverKind::LinKernighan => self.lin_kernighan,
            SolverKind::Insertion => self.insertion,
        }
    }

    fn get_mut(&mut self, kind: SolverKind) -> &mut SolverStats {
        match kind {
            SolverKind::Exact => &mut self.exact,
            SolverKind::LinKernighan => &mut self.lin_kernighan,
            SolverKind::Insertion => &mut self.insertion,
        }
    }

    pub fn record(&mut self, kind: SolverKind, elapsed: Duration) {
        *self.get_mut(kind) += SolverStats {
            attempts: 1,
            total_time: elapsed,
        };
    }

    pub fn total(&self) -> SolverStats {
        let mut total = SolverStats::default();
        for kind in SolverKind::ALL {
            total += self.get(kind);
        }
        total
    }
}

impl AddAssign<&SolverTally> for SolverTally {
    fn add_assign(&mut self, other: &SolverTally) {
        for kind in SolverKind::ALL {
            *self.get_mut(kind) += other.get(kind);
        }
    }
}

/// A tour together with what it costs on the problem it was found for.
#[derive(Clone, Debug, PartialEq)]
pub struct FoundTour {
    pub tour: Vec<usize>,
    /// Total cost, fixed edges included.
    pub length: Cost,
    /// Cheapest non-fixed edge.
    pub min_cost: Cost,
    /// Most expensive non-fixed edge.
    pub max_cost: Cost,
}

impl FoundTour {
    /// Measures `tour` on `problem`.
    pub fn measure(problem: &dyn Problem, tour: Vec<usize>) -> Result<Self> {
        let (min_cost, max_cost) = tour_cost_range(problem, &tour)
            .ok_or_else(|| Error::invalid_data("Tour uses no regular edge"))?;
        Ok(Self {
            length: tour_length(problem, &tour),
            tour,
            min_cost,
            max_cost,
        })
    }

    pub fn gap(&self) -> Cost {
        self.max_cost - self.min_cost
    }
}

/// Everything a search learned, kept up to date while it runs so it can
/// be read even when the search stops on an error.
#[derive(Clone, Debug, Default, PartialEq, KvDisplay)]
pub struct SearchResult {
    pub found_tour: bool,
    /// Bottleneck cost, or the max/min gap for the balanced searches.
    #[kv(name = "objective_value", fmt = "opt")]
    pub objective: Option<Cost>,
    #[kv(fmt = "opt")]
    pub min_cost: Option<Cost>,
    #[kv(fmt = "opt")]
    pub max_cost: Option<Cost>,
    #[kv(fmt = "opt")]
    pub tour_length: Option<Cost>,
    pub optimal: bool,
    pub binary_search_steps: usize,
    #[kv(skip)]
    pub tour: Vec<usize>,
    #[kv(skip)]
    pub solvers: SolverTally,
    #[kv(name = "search_time", fmt = "secs")]
    pub elapsed: Duration,
}

impl SearchResult {
    /// Whether `objective` beats the current best. Anything beats no tour.
    pub fn improves(&self, objective: Cost) -> bool {
        self.objective.is_none_or(|best| objective < best)
    }

    pub fn record(&mut self, objective: Cost, found: &FoundTour) {
        self.found_tour = true;
        self.objective = Some(objective);
        self.min_cost = Some(found.min_cost);
        self.max_cost = Some(found.max_cost);
        self.tour_length = Some(found.length);
        self.tour.clone_from(&found.tour);
    }
}
