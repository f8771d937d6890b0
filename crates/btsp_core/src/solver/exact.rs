//! Held-Karp dynamic program over node subsets.

use crate::{
    Error, Result,
    problem::{Cost, Problem},
};

/// Largest problem the dynamic program accepts. Memory grows with `2^n * n`.
pub const MAX_EXACT_NODES: usize = 16;

/// Minimum-length tour starting at node 0. Works on asymmetric and negative
/// costs.
pub(crate) fn solve(problem: &dyn Problem) -> Result<Vec<usize>> {
    let n = problem.size();
    if n > MAX_EXACT_NODES {
        return Err(Error::invalid_input(format!(
            "Exact solver handles at most {MAX_EXACT_NODES} nodes, got {n}"
        )));
    }
    if n <= 2 {
        return Ok((0..n).collect());
    }

    // Subsets of nodes 1..n, bit `k - 1` for node `k`.
    let m = n - 1;
    let subsets = 1usize << m;
    let mut best = vec![Cost::MAX; subsets * m];
    let mut parent = vec![u8::MAX; subsets * m];

    for k in 0..m {
        best[(1 << k) * m + k] = problem.cost(0, k + 1);
    }

    for mask in 1..subsets {
        for last in 0..m {
            if mask & (1 << last) == 0 {
                continue;
            }
            let here = best[mask * m + last];
            if here == Cost::MAX {
                continue;
            }
            for next in 0..m {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let grown = mask | (1 << next);
                let candidate = here + problem.cost(last + 1, next + 1);
                let slot = grown * m + next;
                if candidate < best[slot] {
                    best[slot] = candidate;
                    parent[slot] = last as u8;
                }
            }
        }
    }

    let full = subsets - 1;
    let (mut last, _) = (0..m)
        .map(|k| (k, best[full * m + k] + problem.cost(k + 1, 0)))
        .min_by_key(|&(_, length)| length)
        .ok_or_else(|| Error::other("Exact solver found no closing edge"))?;

    let mut tour = Vec::with_capacity(n);
    let mut mask = full;
    loop {
        tour.push(last + 1);
        let previous = parent[mask * m + last];
        mask &= !(1 << last);
        if previous == u8::MAX {
            break;
        }
        last = previous as usize;
    }
    tour.push(0);
    tour.reverse();
    Ok(tour)
}
