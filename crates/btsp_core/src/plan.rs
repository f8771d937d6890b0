//! Solve plans: which solver to call with which transform, and how often.

use crate::{
    problem::Cost,
    solver::{LkParams, RaiParams, SolverParams},
    transform::{ApplyMode, Transform},
};

/// One (solver, transform, attempts) entry of a [`SolvePlan`].
#[derive(Clone, Debug)]
pub struct PlanStep {
    pub solver: SolverParams,
    pub transform: Transform,
    pub attempts: usize,
    /// Keep the lowest-bottleneck valid tour among the infeasible attempts.
    pub upper_bound_update: bool,
}

impl PlanStep {
    pub fn new(solver: SolverParams, transform: Transform, attempts: usize) -> Self {
        Self {
            solver,
            transform,
            attempts,
            upper_bound_update: false,
        }
    }

    pub fn with_upper_bound_update(mut self) -> Self {
        self.upper_bound_update = true;
        self
    }
}

/// Ordered steps tried by the feasibility step. The first feasible attempt
/// ends the whole plan.
#[derive(Clone, Debug, Default)]
pub struct SolvePlan {
    steps: Vec<PlanStep>,
}

impl SolvePlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [PlanStep] {
        &mut self.steps
    }

    pub fn total_attempts(&self) -> usize {
        self.steps.iter().map(|step| step.attempts).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_attempts() == 0
    }
}

/// Knobs shared by the plan builders.
#[derive(Clone, Debug)]
pub struct PlanSettings {
    pub lk: LkParams,
    pub rai: RaiParams,
    pub basic_attempts: usize,
    pub shake_attempts: usize,
    pub shake_rand_min: Cost,
    pub shake_rand_max: Cost,
    /// Cost given to edges a transform rules out.
    pub infinity: Cost,
    pub apply_mode: ApplyMode,
    pub seed: u64,
}

impl PlanSettings {
    fn lk(&self) -> SolverParams {
        SolverParams::LinKernighan(self.lk.clone())
    }

    fn transform(&self, transform: Transform) -> Transform {
        transform.with_mode(self.apply_mode)
    }

    fn shake(&self) -> Transform {
        self.transform(Transform::shake(
            self.infinity,
            self.shake_rand_min,
            self.shake_rand_max,
            self.seed,
        ))
    }

    /// Basic Lin-Kernighan attempts, then shaken ones.
    pub fn btsp(&self) -> SolvePlan {
        SolvePlan::new(vec![
            PlanStep::new(self.lk(), self.transform(Transform::basic()), self.basic_attempts),
            PlanStep::new(self.lk(), self.shake(), self.shake_attempts),
        ])
    }

    /// Lin-Kernighan on a doubled problem whose costs are lifted by `shift`.
    pub fn abtsp(&self, shift: Cost) -> SolvePlan {
        SolvePlan::new(vec![PlanStep::new(
            self.lk(),
            self.transform(Transform::asym_shift(shift)),
            self.basic_attempts,
        )])
    }

    /// Randomized insertion with the basic transform.
    pub fn rai(&self) -> SolvePlan {
        SolvePlan::new(vec![PlanStep::new(
            SolverParams::Insertion(self.rai.clone()),
            self.transform(Transform::basic()),
            self.basic_attempts,
        )])
    }

    /// Constrained attempts under a tour length budget. Infeasible tours
    /// still tighten the upper bound.
    pub fn cbtsp(&self, max_length: Cost) -> SolvePlan {
        let lk = self.lk.clone().with_length_bound(max_length);
        SolvePlan::new(vec![
            PlanStep::new(
                SolverParams::LinKernighan(lk),
                self.transform(Transform::constrained(max_length, max_length + 1)),
                self.basic_attempts,
            )
            .with_upper_bound_update(),
        ])
    }

    /// Balanced window attempts, then shaken ones. Doubled problems start
    /// with the shift transform so the pairing edges stay free.
    pub fn balanced(&self, asym_shift: Option<Cost>) -> SolvePlan {
        let first = match asym_shift {
            Some(shift) => Transform::asym_shift(shift),
            None => Transform::balanced(),
        };
        let shake = Transform::balanced_shake(
            self.infinity,
            self.shake_rand_min,
            self.shake_rand_max,
            self.seed,
        );
        SolvePlan::new(vec![
            PlanStep::new(self.lk(), self.transform(first), self.basic_attempts),
            PlanStep::new(self.lk(), self.transform(shake), self.shake_attempts),
        ])
    }

    /// A single exact solve, used to prove there is no cheaper tour.
    pub fn confirm(&self, transform: Transform) -> SolvePlan {
        SolvePlan::new(vec![PlanStep::new(
            SolverParams::Exact,
            self.transform(transform),
            1,
        )])
    }
}
