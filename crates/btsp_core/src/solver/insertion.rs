//! Randomized arbitrary insertion.
//!
//! Builds a tour by inserting nodes in random order at their cheapest gap,
//! then repeatedly tears out a random stretch of the best tour and inserts
//! those nodes again in a fresh random order.

use rand::{Rng, rngs::StdRng, seq::SliceRandom};

use crate::{
    problem::{Cost, Problem, tour_edges, tour_length},
    solver::config::RaiParams,
};

struct Built {
    tour: Vec<usize>,
    score: Cost,
}

pub(crate) fn solve(problem: &dyn Problem, params: &RaiParams, rng: &mut StdRng) -> Vec<usize> {
    let n = problem.size();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut best = construct(problem, params.solve_btsp, order, Vec::new(), rng);
    for iteration in 0..params.iterations {
        if best.score == 0 {
            log::trace!("rai.solve: zero score after {iteration} iterations");
            break;
        }
        let candidate = reinsert_stretch(problem, params.solve_btsp, &best.tour, rng);
        if candidate.score < best.score {
            best = candidate;
        }
    }
    best.tour
}

fn reinsert_stretch(
    problem: &dyn Problem,
    solve_btsp: bool,
    tour: &[usize],
    rng: &mut StdRng,
) -> Built {
    let n = tour.len();
    let u = rng.random_range(0..n);
    let v = rng.random_range(0..n);

    let start = tour.iter().position(|&node| node == u).unwrap_or(0);
    let mut stretch = Vec::new();
    let mut idx = start;
    loop {
        stretch.push(tour[idx]);
        if tour[idx] == v {
            break;
        }
        idx = (idx + 1) % n;
    }
    let kept: Vec<usize> = (stretch.len()..n).map(|k| tour[(start + k) % n]).collect();

    stretch.shuffle(rng);
    construct(problem, solve_btsp, stretch, kept, rng)
}

/// Inserts `pending` front to back into `partial`. When `partial` has fewer
/// than two nodes it is seeded from the back of `pending`.
fn construct(
    problem: &dyn Problem,
    solve_btsp: bool,
    mut pending: Vec<usize>,
    mut partial: Vec<usize>,
    rng: &mut StdRng,
) -> Built {
    while partial.len() < 2 {
        match pending.pop() {
            Some(node) => partial.push(node),
            None => break,
        }
    }

    let mut spots = Vec::new();
    for &v in &pending {
        let (alpha, beta) = top_two(problem, &partial);
        let length = tour_length(problem, &partial);

        let mut best = Cost::MAX;
        spots.clear();
        for (k, (u, w)) in tour_edges(&partial).enumerate() {
            let replaced = problem.cost(u, w);
            let in_cost = problem.cost(u, v);
            let out_cost = problem.cost(v, w);

            let score = if solve_btsp {
                let kept = if replaced == alpha { beta } else { alpha };
                kept.max(in_cost).max(out_cost)
            } else {
                length + in_cost + out_cost - replaced
            };

            if score < best {
                best = score;
                spots.clear();
                spots.push(k);
            } else if score == best {
                spots.push(k);
            }
        }

        let k = spots[rng.random_range(0..spots.len())];
        partial.insert(k + 1, v);
    }

    let score = if solve_btsp {
        top_two(problem, &partial).0
    } else {
        tour_length(problem, &partial)
    };
    Built {
        tour: partial,
        score,
    }
}

/// Largest and second largest edge cost of a closed tour.
fn top_two(problem: &dyn Problem, tour: &[usize]) -> (Cost, Cost) {
    let mut alpha = Cost::MIN;
    let mut beta = Cost::MIN;
    for (u, v) in tour_edges(tour) {
        let cost = problem.cost(u, v);
        if cost > alpha {
            beta = alpha;
            alpha = cost;
        } else if cost > beta {
            beta = cost;
        }
    }
    (alpha, beta)
}
