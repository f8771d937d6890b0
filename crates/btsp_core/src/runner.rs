//! One run per [`Mode`]: option defaults, doubling of directed input, the
//! search itself and a final check of the returned tour.

use std::time::{Duration, Instant};

use crate::{
    Error, Result,
    balanced::{self, BalancedParams},
    bound::{self, BoundKind, BoundResult},
    cleanup::WorkDir,
    cost_index::CostIndex,
    io::options::{Mode, SolverOptions},
    plan::{PlanSettings, SolvePlan},
    problem::{Cost, DoubledProblem, Problem, tour_cost_range, tour_length, validate_tour},
    result::{FoundTour, SearchResult},
    search::{self, SearchParams},
    solver::Solvers,
    transform::Transform,
};

/// What a tour-producing mode found.
#[derive(Clone, Debug)]
pub struct TourOutcome {
    /// The bound the search started from, or for the balanced searches the
    /// gap bound they computed.
    pub lower_bound: BoundResult,
    pub result: SearchResult,
    pub infinity: Option<Cost>,
    pub max_length: Option<Cost>,
}

#[derive(Clone, Debug)]
pub enum Outcome {
    Costs(Vec<Cost>),
    Bound(BoundResult),
    Tour(TourOutcome),
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub mode: Mode,
    pub size: usize,
    pub symmetric: bool,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// How the objective of a tour mode relates to its edges.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Objective {
    Bottleneck,
    Gap,
}

#[btsp_derive::timer("runner.run")]
pub fn run(problem: &dyn Problem, options: &SolverOptions) -> Result<RunReport> {
    let started = Instant::now();
    let index = CostIndex::build(problem, options.hash)?;
    log::info!(
        "runner.start: mode={} n={} symmetric={} distinct_costs={} min={} max={}",
        options.mode,
        problem.size(),
        problem.is_symmetric(),
        index.len(),
        index.min(),
        index.max()
    );

    let work_dir = match options.lkh_path() {
        Some(_) => Some(WorkDir::create(&options.work_dir, options.cleanup)?),
        None => None,
    };
    let mut solvers = Solvers::new(options.seed);
    if let (Some(executable), Some(work_dir)) = (options.lkh_path(), &work_dir) {
        solvers = solvers.with_lkh(executable, work_dir.path());
    }

    let mut session = Session {
        problem,
        index: &index,
        options,
        solvers,
    };
    let outcome = match options.mode {
        Mode::Costs => Outcome::Costs(index.costs().to_vec()),
        Mode::Bbssp => Outcome::Bound(bound::solve(BoundKind::Bbssp, problem, &index)?),
        Mode::Bap => Outcome::Bound(bound::solve(BoundKind::Bap, problem, &index)?),
        Mode::Bscssp => Outcome::Bound(bound::solve(BoundKind::Bscssp, problem, &index)?),
        Mode::Cbap => {
            let kind = BoundKind::Cbap {
                max_length: required_max_length(options)?,
            };
            Outcome::Bound(bound::solve(kind, problem, &index)?)
        }
        Mode::Cbst => {
            let kind = BoundKind::Cbst {
                max_length: required_max_length(options)?,
            };
            Outcome::Bound(bound::solve(kind, problem, &index)?)
        }
        Mode::Btsp => Outcome::Tour(session.btsp()?),
        Mode::Abtsp => Outcome::Tour(session.abtsp()?),
        Mode::AbtspRai => Outcome::Tour(session.abtsp_rai()?),
        Mode::Cbtsp => Outcome::Tour(session.cbtsp()?),
        Mode::BaltspDt => Outcome::Tour(session.double_threshold()?),
        Mode::BaltspIb => Outcome::Tour(session.iterative_bottleneck()?),
    };

    if let Outcome::Tour(tour) = &outcome {
        let objective = match options.mode {
            Mode::BaltspDt | Mode::BaltspIb => Objective::Gap,
            _ => Objective::Bottleneck,
        };
        check_tour(problem, &tour.result, objective, tour.max_length)?;
    }

    Ok(RunReport {
        mode: options.mode,
        size: problem.size(),
        symmetric: problem.is_symmetric(),
        outcome,
        elapsed: started.elapsed(),
    })
}

struct Session<'a> {
    problem: &'a dyn Problem,
    index: &'a CostIndex,
    options: &'a SolverOptions,
    solvers: Solvers,
}

impl Session<'_> {
    fn btsp(&mut self) -> Result<TourOutcome> {
        let problem = self.problem;
        let n = problem.size();
        let rand_max = self.checked_shake_rand_max()?;
        let infinity = self.infinity((self.index.max() + rand_max) * 2)?;
        let mut result = SearchResult::default();

        let lower_bound = if problem.is_symmetric() {
            let settings = self.settings(n, infinity, rand_max);
            let lower_bound = self.lower_bound_or_bbssp(problem)?;
            let confirm = self
                .options
                .confirm
                .then(|| settings.confirm(Transform::basic()));
            self.search(problem, settings.btsp(), confirm, lower_bound.objective, &mut result)?;
            lower_bound
        } else {
            // A feasible doubled tour costs -infinity on each pairing edge
            // and nothing else.
            let doubled = DoubledProblem::new(problem, infinity);
            let mut settings = self.settings(2 * n, infinity, rand_max);
            settings.lk = settings.lk.with_length_bound(-infinity * n as Cost);
            let lower_bound = self.lower_bound_or_bbssp(&doubled)?;
            let confirm = self
                .options
                .confirm
                .then(|| settings.confirm(Transform::basic()));
            self.search(&doubled, settings.btsp(), confirm, lower_bound.objective, &mut result)?;
            map_back(&doubled, &mut result)?;
            lower_bound
        };

        Ok(TourOutcome {
            lower_bound,
            result,
            infinity: Some(infinity),
            max_length: None,
        })
    }

    fn abtsp(&mut self) -> Result<TourOutcome> {
        let problem = self.problem;
        if problem.is_symmetric() {
            return Err(Error::invalid_input(
                "--mode abtsp expects an asymmetric problem, use --mode btsp",
            ));
        }

        let n = problem.size();
        let infinity = self.infinity(self.index.max() * n as Cost + 1)?;
        let doubled = DoubledProblem::new(problem, infinity);
        let mut settings = self.settings(2 * n, infinity, self.shake_rand_max());
        // Shifted by one per arc, a feasible tour costs exactly n.
        settings.lk = settings.lk.with_length_bound(n as Cost);

        let lower_bound = self.lower_bound_or(self.index.min());
        let confirm = self
            .options
            .confirm
            .then(|| settings.confirm(Transform::asym_shift(1)));
        let mut result = SearchResult::default();
        self.search(&doubled, settings.abtsp(1), confirm, lower_bound.objective, &mut result)?;
        map_back(&doubled, &mut result)?;

        Ok(TourOutcome {
            lower_bound,
            result,
            infinity: Some(infinity),
            max_length: None,
        })
    }

    fn abtsp_rai(&mut self) -> Result<TourOutcome> {
        let problem = self.problem;
        let settings = self.settings(problem.size(), self.index.max() + 1, self.shake_rand_max());
        let lower_bound = self.lower_bound_or(self.index.min());
        let params = SearchParams {
            lower_bound: lower_bound.objective,
            upper_bound: Some(self.options.upper_bound.unwrap_or(self.index.max())),
            suppress_ebst: self.options.suppress_ebst,
        };
        let confirm = self
            .options
            .confirm
            .then(|| settings.confirm(Transform::basic()));

        let mut result = SearchResult::default();
        self.search_with(problem, settings.rai(), confirm, &params, &mut result)?;

        Ok(TourOutcome {
            lower_bound,
            result,
            infinity: None,
            max_length: None,
        })
    }

    fn cbtsp(&mut self) -> Result<TourOutcome> {
        let problem = self.problem;
        let max_length = required_max_length(self.options)?;
        let infinity = max_length + 1;
        let settings = self.settings(problem.size(), infinity, self.shake_rand_max());

        let lower_bound = self.lower_bound_or_bbssp(problem)?;
        let confirm = self
            .options
            .confirm
            .then(|| settings.confirm(Transform::constrained(max_length, infinity)));
        let mut result = SearchResult::default();
        self.search(
            problem,
            settings.cbtsp(max_length),
            confirm,
            lower_bound.objective,
            &mut result,
        )?;

        Ok(TourOutcome {
            lower_bound,
            result,
            infinity: Some(infinity),
            max_length: Some(max_length),
        })
    }

    fn double_threshold(&mut self) -> Result<TourOutcome> {
        let problem = self.problem;
        let n = problem.size();
        let rand_max = self.checked_shake_rand_max()?;
        let infinity = self.infinity((self.index.max() + rand_max) * 2)?;
        let params = self.balanced_params(infinity);
        let mut result = SearchResult::default();

        let lower_bound = if problem.is_symmetric() {
            let mut plan = self.settings(n, infinity, rand_max).balanced(None);
            let outcome = balanced::double_threshold(
                problem,
                problem,
                self.index,
                &mut plan,
                &mut self.solvers,
                &params,
                &mut result,
            );
            keep_partial(outcome, &result)?
        } else {
            let doubled = DoubledProblem::new(problem, infinity);
            let mut plan = self
                .settings(2 * n, infinity, rand_max)
                .balanced(Some(infinity));
            let outcome = balanced::double_threshold(
                problem,
                &doubled,
                self.index,
                &mut plan,
                &mut self.solvers,
                &params,
                &mut result,
            );
            let lower_bound = keep_partial(outcome, &result)?;
            map_back(&doubled, &mut result)?;
            lower_bound
        };

        Ok(TourOutcome {
            lower_bound,
            result,
            infinity: Some(infinity),
            max_length: None,
        })
    }

    fn iterative_bottleneck(&mut self) -> Result<TourOutcome> {
        let rand_max = self.checked_shake_rand_max()?;
        let infinity = self.infinity((self.index.max() + rand_max) * 2)?;
        let params = self.balanced_params(infinity);
        let mut plan = self
            .settings(self.problem.size(), infinity, rand_max)
            .btsp();

        let mut result = SearchResult::default();
        let outcome = balanced::iterative_bottleneck(
            self.problem,
            self.index,
            &mut plan,
            &mut self.solvers,
            &params,
            &mut result,
        );
        let lower_bound = keep_partial(outcome, &result)?;

        Ok(TourOutcome {
            lower_bound,
            result,
            infinity: Some(infinity),
            max_length: None,
        })
    }

    fn search(
        &mut self,
        problem: &dyn Problem,
        plan: SolvePlan,
        confirm: Option<SolvePlan>,
        lower_bound: Cost,
        result: &mut SearchResult,
    ) -> Result<()> {
        let params = SearchParams {
            lower_bound,
            upper_bound: self.options.upper_bound,
            suppress_ebst: self.options.suppress_ebst,
        };
        self.search_with(problem, plan, confirm, &params, result)
    }

    fn search_with(
        &mut self,
        problem: &dyn Problem,
        mut plan: SolvePlan,
        mut confirm: Option<SolvePlan>,
        params: &SearchParams,
        result: &mut SearchResult,
    ) -> Result<()> {
        let outcome = search::solve(
            problem,
            self.index,
            &mut plan,
            confirm.as_mut(),
            &mut self.solvers,
            params,
            result,
        );
        keep_partial(outcome, result)
    }

    fn settings(&self, n: usize, infinity: Cost, shake_rand_max: Cost) -> PlanSettings {
        let options = self.options;
        PlanSettings {
            lk: options.lk_params(n),
            rai: options.rai_params(n),
            basic_attempts: options.basic_attempts,
            shake_attempts: options.shake_attempts,
            shake_rand_min: options.shake_rand_min,
            shake_rand_max,
            infinity,
            apply_mode: options.apply_mode(),
            seed: options.seed,
        }
    }

    fn balanced_params(&self, infinity: Cost) -> BalancedParams {
        BalancedParams {
            lower_bound: self.options.lower_bound.unwrap_or(self.index.min()),
            upper_bound: self.options.upper_bound.unwrap_or(self.index.max()),
            lb_only: self.options.lb_only,
            with_improvements: self.options.with_improvements,
            infinity,
        }
    }

    fn shake_rand_max(&self) -> Cost {
        let n = self.problem.size() as Cost;
        self.options
            .shake_rand_max
            .unwrap_or(n * n + self.options.shake_rand_min)
    }

    /// Shake offsets are distinct per cost, so the interval has to hold one
    /// value per distinct cost.
    fn checked_shake_rand_max(&self) -> Result<Cost> {
        let rand_min = self.options.shake_rand_min;
        let rand_max = self.shake_rand_max();
        if rand_max - rand_min < self.index.len() as Cost {
            return Err(Error::invalid_input(format!(
                "Shake random interval [{rand_min},{rand_max}] is smaller than the {} distinct costs",
                self.index.len()
            )));
        }
        Ok(rand_max)
    }

    fn infinity(&self, default: Cost) -> Result<Cost> {
        match self.options.infinity {
            None => Ok(default),
            Some(infinity) if infinity < self.index.max() => Err(Error::invalid_input(format!(
                "Infinity {infinity} is below the largest cost {}",
                self.index.max()
            ))),
            Some(infinity) => Ok(infinity),
        }
    }

    fn lower_bound_or(&self, default: Cost) -> BoundResult {
        BoundResult {
            objective: self.options.lower_bound.unwrap_or(default),
            elapsed: Duration::ZERO,
        }
    }

    fn lower_bound_or_bbssp(&self, problem: &dyn Problem) -> Result<BoundResult> {
        match self.options.lower_bound {
            Some(objective) => Ok(BoundResult {
                objective,
                elapsed: Duration::ZERO,
            }),
            None => {
                let bound = bound::solve(BoundKind::Bbssp, problem, self.index)?;
                log::info!("runner.lower_bound: bbssp={}", bound.objective);
                Ok(bound)
            }
        }
    }
}

fn required_max_length(options: &SolverOptions) -> Result<Cost> {
    options.max_length.ok_or_else(|| {
        Error::invalid_input(format!("--mode {} needs --max-length", options.mode))
    })
}

/// Logs what a failed search had found before handing the error on.
fn keep_partial<T>(outcome: Result<T>, result: &SearchResult) -> Result<T> {
    if let Err(err) = &outcome {
        log::warn!("runner.failed: err={err} partial_result={result}");
    }
    outcome
}

/// Rewrites a doubled-problem result in terms of the directed problem.
fn map_back(doubled: &DoubledProblem<'_>, result: &mut SearchResult) -> Result<()> {
    let (true, Some(objective)) = (result.found_tour, result.objective) else {
        return Ok(());
    };

    let directed = doubled.map_tour_back(&result.tour)?;
    let found = FoundTour::measure(doubled.base(), directed)?;
    if let Some(symmetric_length) = result.tour_length
        && doubled.asymmetric_length(symmetric_length) != found.length
    {
        return Err(Error::invalid_data(format!(
            "Directed tour length {} does not match doubled length {symmetric_length}",
            found.length
        )));
    }
    result.record(objective, &found);
    Ok(())
}

/// The returned tour visits every node once and its edges agree with the
/// reported window, length and objective.
fn check_tour(
    problem: &dyn Problem,
    result: &SearchResult,
    objective: Objective,
    max_length: Option<Cost>,
) -> Result<()> {
    if !result.found_tour {
        return Ok(());
    }
    validate_tour(problem.size(), &result.tour)?;

    let range = tour_cost_range(problem, &result.tour);
    let reported = result.min_cost.zip(result.max_cost);
    if range != reported {
        return Err(Error::invalid_data(format!(
            "Tour edges span {range:?}, reported {reported:?}"
        )));
    }

    let length = tour_length(problem, &result.tour);
    if result.tour_length != Some(length) {
        return Err(Error::invalid_data(format!(
            "Tour length is {length}, reported {:?}",
            result.tour_length
        )));
    }
    if let Some(max_length) = max_length
        && length > max_length
    {
        return Err(Error::invalid_data(format!(
            "Tour length {length} exceeds the budget {max_length}"
        )));
    }

    let expected = match (objective, range) {
        (Objective::Bottleneck, Some((_, max))) => Some(max),
        (Objective::Gap, Some((min, max))) => Some(max - min),
        (_, None) => None,
    };
    if result.objective != expected {
        return Err(Error::invalid_data(format!(
            "Objective {:?} does not match the tour ({expected:?})",
            result.objective
        )));
    }
    Ok(())
}
