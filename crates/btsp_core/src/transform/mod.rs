//! Cost-matrix transforms.
//!
//! A [`Transform`] rewrites the costs of a base problem around a [`Window`]
//! so that a plain minimum-length tour solver answers a threshold question,
//! and decides from the returned tour whether the answer is "yes".

mod view;

pub use view::{DerivedProblem, TransformedView};

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
};

use rand::{SeedableRng, rngs::StdRng, seq::index};

use crate::{
    Error, Result,
    cost_index::CostIndex,
    problem::{Cost, MatrixProblem, Problem, fixed_edges_used, tour_edges, tour_length},
    window::Window,
};

/// How [`Transform::apply`] builds the derived problem.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ApplyMode {
    /// Borrow the base problem and rewrite costs on lookup.
    #[default]
    Shallow,
    /// Materialize a new matrix.
    Deep,
}

/// Random per-cost offsets redrawn by [`Transform::initialize`].
#[derive(Clone, Debug)]
pub struct ShakeState {
    infinity: Cost,
    rand_min: Cost,
    rand_max: Cost,
    rng: StdRng,
    offsets: HashMap<Cost, Cost>,
}

impl ShakeState {
    pub fn new(infinity: Cost, rand_min: Cost, rand_max: Cost, seed: u64) -> Self {
        Self {
            infinity,
            rand_min,
            rand_max,
            rng: StdRng::seed_from_u64(seed),
            offsets: HashMap::new(),
        }
    }

    /// Draws one distinct offset per distinct cost, in increasing order so the
    /// cheapest cost gets the smallest offset.
    fn redraw(&mut self, index: &CostIndex) -> Result<()> {
        let span = self.rand_max - self.rand_min;
        if span < index.len() as Cost {
            return Err(Error::invalid_input(format!(
                "Shake random interval [{}, {}] is smaller than the {} distinct costs",
                self.rand_min,
                self.rand_max,
                index.len()
            )));
        }

        let mut draws = index::sample(&mut self.rng, span as usize + 1, index.len()).into_vec();
        draws.sort_unstable();

        self.offsets = index
            .costs()
            .iter()
            .zip(draws)
            .map(|(&cost, draw)| (cost, self.rand_min + draw as Cost))
            .collect();
        Ok(())
    }

    fn offset(&self, cost: Cost) -> Cost {
        self.offsets.get(&cost).copied().unwrap_or(self.infinity)
    }
}

#[derive(Clone, Debug)]
pub enum TransformKind {
    /// In-window edges cost 0, the rest keep their cost.
    Basic,
    /// Basic, with out-of-window edges pushed up by a random offset.
    Shake(ShakeState),
    /// Edges above the window cost `infinity`; the tour must fit the budget.
    Constrained {
        feasible_length: Cost,
        infinity: Cost,
    },
    /// Basic for doubled problems, shifted so every cost is non-negative.
    AsymShift { shift: Cost },
    /// In-window edges cost 0, the rest `cost + 1`.
    Balanced,
    /// In-window edges cost `max - cost`, the rest `n * (max - min + 1)`.
    BalancedTolerance,
    /// Balanced, with out-of-window edges pushed up by a random offset.
    BalancedShake(ShakeState),
    /// Edges cheaper than the window floor cost `infinity`.
    IterativeBottleneck { infinity: Cost },
}

#[derive(Clone, Debug)]
pub struct Transform {
    kind: TransformKind,
    mode: ApplyMode,
}

impl Transform {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            kind,
            mode: ApplyMode::default(),
        }
    }

    pub fn basic() -> Self {
        Self::new(TransformKind::Basic)
    }

    pub fn shake(infinity: Cost, rand_min: Cost, rand_max: Cost, seed: u64) -> Self {
        Self::new(TransformKind::Shake(ShakeState::new(
            infinity, rand_min, rand_max, seed,
        )))
    }

    pub fn constrained(feasible_length: Cost, infinity: Cost) -> Self {
        Self::new(TransformKind::Constrained {
            feasible_length,
            infinity,
        })
    }

    pub fn asym_shift(shift: Cost) -> Self {
        Self::new(TransformKind::AsymShift { shift })
    }

    pub fn balanced() -> Self {
        Self::new(TransformKind::Balanced)
    }

    pub fn balanced_tolerance() -> Self {
        Self::new(TransformKind::BalancedTolerance)
    }

    pub fn balanced_shake(infinity: Cost, rand_min: Cost, rand_max: Cost, seed: u64) -> Self {
        Self::new(TransformKind::BalancedShake(ShakeState::new(
            infinity, rand_min, rand_max, seed,
        )))
    }

    pub fn iterative_bottleneck(infinity: Cost) -> Self {
        Self::new(TransformKind::IterativeBottleneck { infinity })
    }

    pub fn with_mode(mut self, mode: ApplyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> &TransformKind {
        &self.kind
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            TransformKind::Basic => "basic",
            TransformKind::Shake(_) => "shake",
            TransformKind::Constrained { .. } => "constrained",
            TransformKind::AsymShift { .. } => "asym-shift",
            TransformKind::Balanced => "balanced",
            TransformKind::BalancedTolerance => "balanced-tolerance",
            TransformKind::BalancedShake(_) => "balanced-shake",
            TransformKind::IterativeBottleneck { .. } => "iterative-bottleneck",
        }
    }

    /// Prepares the transform for the next attempt. Shake variants redraw
    /// their offsets; the others have nothing to do.
    pub fn initialize(&mut self, index: &CostIndex) -> Result<()> {
        match &mut self.kind {
            TransformKind::Shake(state) | TransformKind::BalancedShake(state) => {
                state.redraw(index)
            }
            _ => Ok(()),
        }
    }

    /// Transformed cost of `i -> j`. The diagonal stays 0.
    pub fn cost(&self, base: &dyn Problem, window: Window, i: usize, j: usize) -> Cost {
        if i == j {
            return 0;
        }

        let cost = base.cost(i, j);
        match &self.kind {
            TransformKind::Basic => {
                if cost >= 0 && window.contains(cost) {
                    0
                } else {
                    cost
                }
            }
            TransformKind::Shake(state) => {
                if cost < 0 {
                    cost
                } else if window.contains(cost) {
                    0
                } else {
                    cost + state.offset(cost)
                }
            }
            TransformKind::Constrained { infinity, .. } => {
                if cost <= window.max {
                    cost
                } else {
                    *infinity
                }
            }
            TransformKind::AsymShift { shift } => {
                if cost < 0 {
                    0
                } else if window.contains(cost) {
                    *shift
                } else {
                    cost + shift
                }
            }
            TransformKind::Balanced => {
                if window.admits(cost) {
                    0
                } else {
                    cost + 1
                }
            }
            TransformKind::BalancedTolerance => {
                if cost < 0 {
                    0
                } else if window.contains(cost) {
                    window.max - cost
                } else {
                    tolerance_ceiling(base, window)
                }
            }
            TransformKind::BalancedShake(state) => {
                if window.admits(cost) {
                    0
                } else {
                    cost + state.offset(cost) + 1
                }
            }
            TransformKind::IterativeBottleneck { infinity } => {
                if cost >= 0 && cost < window.min {
                    *infinity
                } else {
                    cost
                }
            }
        }
    }

    /// Builds the transformed problem the way [`Transform::mode`] asks for.
    pub fn apply<'a>(&'a self, base: &'a dyn Problem, window: Window) -> DerivedProblem<'a> {
        match self.mode {
            ApplyMode::Shallow => DerivedProblem::View(TransformedView::new(base, self, window)),
            ApplyMode::Deep => DerivedProblem::Owned(
                MatrixProblem::from_fn(base.size(), base.is_symmetric(), |i, j| {
                    self.cost(base, window, i, j)
                })
                .with_fixed_edges(base.fixed_edges()),
            ),
        }
    }

    /// Whether a tour found on the transformed problem answers "yes".
    ///
    /// `tour_length` is measured on the transformed problem; `tour` indexes
    /// the base problem.
    pub fn feasible(
        &self,
        base: &dyn Problem,
        window: Window,
        tour_length: Cost,
        tour: &[usize],
    ) -> bool {
        let pairs_used = fixed_edges_used(base, tour) == base.fixed_edges();
        match &self.kind {
            TransformKind::Basic | TransformKind::Shake(_) => {
                pairs_used && within_window(base, window, tour)
            }
            TransformKind::Constrained {
                feasible_length, ..
            } => {
                tour_length <= *feasible_length
                    && tour_edges(tour).all(|(u, v)| base.cost(u, v) <= window.max)
            }
            TransformKind::AsymShift { shift } => {
                let shifted = tour_edges(tour)
                    .filter(|&(u, v)| base.cost(u, v) >= 0)
                    .count() as Cost;
                pairs_used
                    && within_window(base, window, tour)
                    && tour_length - shift * shifted == 0
            }
            TransformKind::Balanced | TransformKind::BalancedShake(_) => {
                pairs_used && tour_length == 0
            }
            TransformKind::BalancedTolerance => {
                pairs_used && tour_length < tolerance_ceiling(base, window)
            }
            TransformKind::IterativeBottleneck { .. } => tour_edges(tour)
                .map(|(u, v)| base.cost(u, v))
                .all(|c| c < 0 || c >= window.min),
        }
    }
}

impl Transform {
    /// Whether a tour this transform rejected may still stand as an upper
    /// bound: it has to use every pairing edge and stay within any length
    /// budget.
    pub fn accepts_as_upper_bound(&self, base: &dyn Problem, tour: &[usize]) -> bool {
        if fixed_edges_used(base, tour) != base.fixed_edges() {
            return false;
        }
        match &self.kind {
            TransformKind::Constrained {
                feasible_length, ..
            } => tour_length(base, tour) <= *feasible_length,
            _ => true,
        }
    }
}

impl Display for Transform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn within_window(base: &dyn Problem, window: Window, tour: &[usize]) -> bool {
    tour_edges(tour).all(|(u, v)| window.admits(base.cost(u, v)))
}

/// Out-of-window cost of the tolerance transform, `n * (max - min + 1)`.
fn tolerance_ceiling(base: &dyn Problem, window: Window) -> Cost {
    base.size() as Cost * (window.max - window.min + 1)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::{ApplyMode, Transform};
    use crate::{
        cost_index::CostIndex,
        fixtures::{directed_three, five_node},
        problem::{DoubledProblem, MatrixProblem, Problem, tour_length},
        window::Window,
    };

    fn random_tour(n: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut tour: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = rng.random_range(0..=i);
            tour.swap(i, j);
        }
        tour
    }

    #[test]
    fn basic_at_max_cost_accepts_every_tour() {
        let problem = five_node();
        let index = CostIndex::build(&problem, false).expect("index");
        let transform = Transform::basic();
        let window = Window::ceiling(index.max());
        let derived = transform.apply(&problem, window);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let tour = random_tour(problem.size(), &mut rng);
            let length = tour_length(&derived, &tour);
            assert_eq!(length, 0);
            assert!(transform.feasible(&problem, window, length, &tour));
        }
    }

    #[test]
    fn basic_rejects_tour_over_threshold() {
        let problem = five_node();
        let transform = Transform::basic();
        let window = Window::ceiling(3);
        let tour = [0, 2, 3, 1, 4];
        let length = tour_length(&transform.apply(&problem, window), &tour);

        assert_eq!(length, 4);
        assert!(!transform.feasible(&problem, window, length, &tour));
        assert!(transform.feasible(&problem, Window::ceiling(4), 0, &tour));
    }

    #[test]
    fn shallow_and_deep_apply_agree() {
        let problem = five_node();
        let window = Window::new(2, 4);
        for transform in [
            Transform::basic(),
            Transform::balanced(),
            Transform::balanced_tolerance(),
            Transform::constrained(40, 1000),
            Transform::iterative_bottleneck(1000),
        ] {
            let deep = transform.clone().with_mode(ApplyMode::Deep);
            let shallow_problem = transform.apply(&problem, window);
            let deep_problem = deep.apply(&problem, window);
            assert!(shallow_problem.is_view());
            assert!(!deep_problem.is_view());
            assert_eq!(
                MatrixProblem::materialize(&shallow_problem),
                MatrixProblem::materialize(&deep_problem),
                "{transform} differs between modes"
            );
        }
    }

    #[test]
    fn shake_offsets_are_distinct_and_seeded() {
        let problem = five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let window = Window::ceiling(3);

        let mut first = Transform::shake(10_000, 0, 100, 42);
        let mut second = Transform::shake(10_000, 0, 100, 42);
        first.initialize(&index).expect("init");
        second.initialize(&index).expect("init");

        let a = MatrixProblem::materialize(&first.apply(&problem, window));
        let b = MatrixProblem::materialize(&second.apply(&problem, window));
        assert_eq!(a, b);

        // Out-of-window costs keep their order after shaking.
        assert!(a.cost(2, 3) > 4);
        assert!(a.cost(0, 1) > a.cost(2, 3));
        assert!(a.cost(3, 4) > a.cost(2, 4));
        assert_eq!(a.cost(0, 2), 0);
    }

    #[test]
    fn shake_rejects_small_random_interval() {
        let problem = five_node();
        let index = CostIndex::build(&problem, false).expect("index");
        let mut transform = Transform::shake(1000, 0, 3, 1);
        assert!(transform.initialize(&index).is_err());
    }

    #[test]
    fn constrained_needs_length_budget() {
        let problem = five_node();
        let tour = [0, 2, 3, 1, 4];
        let window = Window::ceiling(4);
        let length = tour_length(&Transform::constrained(0, 1000).apply(&problem, window), &tour);

        assert_eq!(length, 1 + 4 + 2 + 3 + 3);
        assert!(Transform::constrained(13, 1000).feasible(&problem, window, length, &tour));
        assert!(!Transform::constrained(12, 1000).feasible(&problem, window, length, &tour));
    }

    #[test]
    fn balanced_variants_measure_window_fit() {
        let problem = five_node();
        let tour = [0, 2, 3, 1, 4];
        let inside = Window::new(1, 4);
        let outside = Window::new(2, 4);

        let balanced = Transform::balanced();
        let len_in = tour_length(&balanced.apply(&problem, inside), &tour);
        let len_out = tour_length(&balanced.apply(&problem, outside), &tour);
        assert!(balanced.feasible(&problem, inside, len_in, &tour));
        assert_eq!(len_out, 2);
        assert!(!balanced.feasible(&problem, outside, len_out, &tour));

        let tolerance = Transform::balanced_tolerance();
        let len_tol = tour_length(&tolerance.apply(&problem, inside), &tour);
        assert_eq!(len_tol, 3 + 0 + 2 + 1 + 1);
        assert!(tolerance.feasible(&problem, inside, len_tol, &tour));
        let len_tol_out = tour_length(&tolerance.apply(&problem, outside), &tour);
        assert!(!tolerance.feasible(&problem, outside, len_tol_out, &tour));
    }

    #[test]
    fn iterative_bottleneck_hides_cheap_edges() {
        let problem = five_node();
        let transform = Transform::iterative_bottleneck(1000);
        let window = Window::new(2, 10);
        let derived = transform.apply(&problem, window);

        assert_eq!(derived.cost(0, 2), 1000);
        assert_eq!(derived.cost(0, 3), 2);
        assert!(!transform.feasible(&problem, window, 0, &[0, 2, 3, 1, 4]));
        assert!(transform.feasible(&problem, window, 0, &[0, 3, 2, 4, 1]));
    }

    #[test]
    fn upper_bound_candidates_respect_pairing_and_budget() {
        let problem = five_node();
        let tour = [0, 2, 3, 1, 4];
        assert!(Transform::basic().accepts_as_upper_bound(&problem, &tour));
        assert!(Transform::constrained(13, 14).accepts_as_upper_bound(&problem, &tour));
        assert!(!Transform::constrained(12, 13).accepts_as_upper_bound(&problem, &tour));

        let base = directed_three();
        let doubled = DoubledProblem::new(&base, 1000);
        assert!(Transform::basic().accepts_as_upper_bound(&doubled, &[0, 4, 1, 5, 2, 3]));
        assert!(!Transform::basic().accepts_as_upper_bound(&doubled, &[0, 4, 2, 3, 1, 5]));
    }

    #[test]
    fn doubled_tours_must_use_every_pairing_edge() {
        let base = directed_three();
        let doubled = DoubledProblem::new(&base, 1000);
        let window = Window::ceiling(9);
        let basic = Transform::basic();
        let shift = Transform::asym_shift(5);

        let paired = [0, 4, 1, 5, 2, 3];
        let unpaired = [0, 4, 2, 3, 1, 5];
        let shifted = shift.apply(&doubled, window);

        assert!(basic.feasible(&doubled, window, 0, &paired));
        assert!(!basic.feasible(&doubled, window, 0, &unpaired));
        assert!(shift.feasible(&doubled, window, tour_length(&shifted, &paired), &paired));
        let tight = Window::ceiling(3);
        let tight_length = tour_length(&shift.apply(&doubled, tight), &paired);
        assert_eq!(tight_length, 5 + 5 + 9);
        assert!(!shift.feasible(&doubled, tight, tight_length, &paired));
        assert!(shifted.cost(0, 3) == 0 && shifted.cost(0, 1) == 1005);
    }

    #[test]
    fn asym_shift_honours_the_window_floor() {
        let window = Window::new(2, 9);
        let shift = Transform::asym_shift(1);
        let paired = [0, 4, 1, 5, 2, 3];

        let cheap_arc = MatrixProblem::from_rows(vec![vec![0, 0, 9], vec![7, 0, 3], vec![4, 8, 0]])
            .expect("valid matrix");
        let doubled = DoubledProblem::new(&cheap_arc, 1000);
        let length = tour_length(&shift.apply(&doubled, window), &paired);
        assert!(!Transform::basic().feasible(&doubled, window, 0, &paired));
        assert!(!shift.feasible(&doubled, window, length, &paired));

        let base = directed_three();
        let doubled = DoubledProblem::new(&base, 1000);
        let length = tour_length(&shift.apply(&doubled, window), &paired);
        assert!(Transform::basic().feasible(&doubled, window, 0, &paired));
        assert!(shift.feasible(&doubled, window, length, &paired));
    }
}
