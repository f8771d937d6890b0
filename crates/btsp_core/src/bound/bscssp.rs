//! Bottleneck strongly connected spanning subgraph.

use std::time::Instant;

use super::{BoundResult, threshold_search};
use crate::{Result, cost_index::CostIndex, problem::Problem, window::Window};

#[btsp_derive::timer("bscssp.solve")]
pub fn solve(problem: &dyn Problem, index: &CostIndex) -> Result<BoundResult> {
    let started = Instant::now();
    let objective = threshold_search(index, |window| strongly_connected(problem, window));
    log::debug!("bscssp.solve: n={} objective={objective}", problem.size());

    Ok(BoundResult {
        objective,
        elapsed: started.elapsed(),
    })
}

/// Whether node 0 reaches every node along admitted arcs and is reached
/// from every node.
pub fn strongly_connected(problem: &dyn Problem, window: Window) -> bool {
    reaches_all(problem.size(), |u, v| window.admits(problem.cost(u, v)))
        && reaches_all(problem.size(), |u, v| window.admits(problem.cost(v, u)))
}

fn reaches_all(n: usize, arc: impl Fn(usize, usize) -> bool) -> bool {
    let mut visited = vec![false; n];
    let mut stack = vec![0];
    visited[0] = true;
    let mut count = 1;

    while let Some(u) = stack.pop() {
        for v in 0..n {
            if !visited[v] && v != u && arc(u, v) {
                visited[v] = true;
                count += 1;
                stack.push(v);
            }
        }
    }

    count == n
}
