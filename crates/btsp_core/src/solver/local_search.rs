//! 2-opt and Or-opt descents plus the kicks that restart them.

use std::time::Instant;

use rand::{Rng, rngs::StdRng, seq::index};

use crate::{
    problem::{Cost, Problem, tour_length},
    solver::config::KickType,
};

/// Longest segment Or-opt relocates.
const OR_OPT_MAX_SEGMENT: usize = 3;
/// Longest segment a walk kick reverses.
const WALK_MAX_SEGMENT: usize = 50;
/// Double-bridge needs at least this many nodes to cut the tour in four.
const DOUBLE_BRIDGE_MIN_NODES: usize = 8;

pub(crate) struct LocalSearch<'a> {
    problem: &'a dyn Problem,
    deadline: Option<Instant>,
}

impl<'a> LocalSearch<'a> {
    pub(crate) fn new(problem: &'a dyn Problem, deadline: Option<Instant>) -> Self {
        Self { problem, deadline }
    }

    pub(crate) fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Improves `tour` until neither move finds a gain and returns its length.
    ///
    /// 2-opt reverses a segment, so it only runs on symmetric problems.
    /// Or-opt keeps segment orientation and runs on both.
    pub(crate) fn descend(&self, tour: &mut Vec<usize>) -> Cost {
        let mut length = tour_length(self.problem, tour);
        loop {
            let mut gain = 0;
            if self.problem.is_symmetric() {
                gain += self.two_opt_pass(tour);
            }
            gain += self.or_opt_pass(tour);

            length -= gain;
            if gain == 0 || self.expired() {
                return length;
            }
        }
    }

    fn cost(&self, i: usize, j: usize) -> Cost {
        self.problem.cost(i, j)
    }

    fn two_opt_pass(&self, tour: &mut [usize]) -> Cost {
        let n = tour.len();
        if n < 4 {
            return 0;
        }

        let mut total = 0;
        for i in 0..n - 2 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = (tour[i], tour[i + 1]);
                let (c, d) = (tour[j], tour[(j + 1) % n]);
                let delta = self.cost(a, c) + self.cost(b, d) - self.cost(a, b) - self.cost(c, d);
                if delta < 0 {
                    tour[i + 1..=j].reverse();
                    total -= delta;
                }
            }
            if self.expired() {
                break;
            }
        }
        total
    }

    fn or_opt_pass(&self, tour: &mut Vec<usize>) -> Cost {
        let n = tour.len();
        let mut total = 0;
        for segment_len in 1..=OR_OPT_MAX_SEGMENT.min(n.saturating_sub(3)) {
            for start in 0..n {
                if let Some(gain) = self.relocate(tour, start, segment_len) {
                    total += gain;
                }
            }
            if self.expired() {
                break;
            }
        }
        total
    }

    /// Moves the segment starting at position `start` to its best gap.
    fn relocate(&self, tour: &mut Vec<usize>, start: usize, segment_len: usize) -> Option<Cost> {
        let n = tour.len();
        let segment: Vec<usize> = (0..segment_len).map(|k| tour[(start + k) % n]).collect();
        let rest: Vec<usize> = (segment_len..n).map(|k| tour[(start + k) % n]).collect();

        let (first, last) = (segment[0], segment[segment_len - 1]);
        let (prev, next) = (rest[rest.len() - 1], rest[0]);
        let removal = self.cost(prev, first) + self.cost(last, next) - self.cost(prev, next);

        // The gap between the last and first element of `rest` is where the
        // segment came from.
        let mut best: Option<(usize, Cost)> = None;
        for k in 0..rest.len() - 1 {
            let (p, q) = (rest[k], rest[k + 1]);
            let insertion = self.cost(p, first) + self.cost(last, q) - self.cost(p, q);
            let gain = removal - insertion;
            if gain > 0 && best.is_none_or(|(_, top)| gain > top) {
                best = Some((k, gain));
            }
        }

        let (k, gain) = best?;
        let mut rebuilt = Vec::with_capacity(n);
        rebuilt.extend_from_slice(&rest[..=k]);
        rebuilt.extend_from_slice(&segment);
        rebuilt.extend_from_slice(&rest[k + 1..]);
        *tour = rebuilt;
        Some(gain)
    }
}

/// Perturbs `tour` so the next descent starts somewhere new.
pub(crate) fn kick(tour: &[usize], kick_type: KickType, rng: &mut StdRng) -> Vec<usize> {
    let n = tour.len();
    if kick_type == KickType::DoubleBridge && n >= DOUBLE_BRIDGE_MIN_NODES {
        return double_bridge(tour, rng);
    }
    if n < 3 {
        return tour.to_vec();
    }

    let start = rng.random_range(0..n);
    let len = rng.random_range(2..=n.min(WALK_MAX_SEGMENT));
    let mut kicked = tour.to_vec();
    let values: Vec<usize> = (0..len).map(|k| tour[(start + k) % n]).collect();
    for (k, value) in values.into_iter().rev().enumerate() {
        kicked[(start + k) % n] = value;
    }
    kicked
}

fn double_bridge(tour: &[usize], rng: &mut StdRng) -> Vec<usize> {
    let mut cuts = index::sample(rng, tour.len() - 1, 3).into_vec();
    cuts.sort_unstable();
    let (a, b, c) = (cuts[0] + 1, cuts[1] + 1, cuts[2] + 1);

    let mut kicked = Vec::with_capacity(tour.len());
    kicked.extend_from_slice(&tour[..a]);
    kicked.extend_from_slice(&tour[b..c]);
    kicked.extend_from_slice(&tour[a..b]);
    kicked.extend_from_slice(&tour[c..]);
    kicked
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::{LocalSearch, kick};
    use crate::{
        fixtures,
        problem::{MatrixProblem, tour_length, validate_tour},
        solver::config::KickType,
    };

    #[test]
    fn descend_untangles_a_crossed_ring() {
        let problem = fixtures::ring(8);
        let mut tour = vec![0, 4, 1, 5, 2, 6, 3, 7];
        let before = tour_length(&problem, &tour);

        let length = LocalSearch::new(&problem, None).descend(&mut tour);

        validate_tour(8, &tour).expect("valid tour");
        assert_eq!(length, tour_length(&problem, &tour));
        assert!(length < before);
    }

    #[test]
    fn descend_relocates_nodes_on_directed_problem() {
        let problem = MatrixProblem::from_rows(vec![
            vec![0, 1, 9, 9, 9],
            vec![9, 0, 1, 9, 9],
            vec![9, 9, 0, 1, 9],
            vec![9, 9, 9, 0, 1],
            vec![1, 9, 9, 9, 0],
        ])
        .expect("valid matrix");
        let mut tour = vec![0, 2, 1, 3, 4];

        let length = LocalSearch::new(&problem, None).descend(&mut tour);

        assert_eq!(length, 5);
        assert_eq!(length, tour_length(&problem, &tour));
    }

    #[test]
    fn kicks_keep_a_permutation() {
        let mut rng = StdRng::seed_from_u64(5);
        let tour: Vec<usize> = (0..12).collect();

        for kick_type in [KickType::Walk, KickType::DoubleBridge] {
            for _ in 0..20 {
                let kicked = kick(&tour, kick_type, &mut rng);
                validate_tour(12, &kicked).expect("valid tour");
            }
        }
    }

    #[test]
    fn double_bridge_changes_the_tour() {
        let mut rng = StdRng::seed_from_u64(11);
        let tour: Vec<usize> = (0..10).collect();
        let kicked = kick(&tour, KickType::DoubleBridge, &mut rng);
        assert_ne!(kicked, tour);
    }
}
