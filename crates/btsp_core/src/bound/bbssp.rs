//! Bottleneck biconnected spanning subgraph.

use std::time::Instant;

use super::{BoundResult, threshold_search};
use crate::{
    Error, Result,
    cost_index::CostIndex,
    problem::Problem,
    window::Window,
};

const UNVISITED: usize = usize::MAX;

/// Smallest threshold at which the admitted edges form a biconnected graph.
///
/// Only defined for symmetric problems.
#[btsp_derive::timer("bbssp.solve")]
pub fn solve(problem: &dyn Problem, index: &CostIndex) -> Result<BoundResult> {
    if !problem.is_symmetric() {
        return Err(Error::invalid_input(
            "BBSSP only works on symmetric cost matrices",
        ));
    }

    let started = Instant::now();
    let objective = threshold_search(index, |window| biconnected(problem, window));
    log::debug!("bbssp.solve: n={} objective={objective}", problem.size());

    Ok(BoundResult {
        objective,
        elapsed: started.elapsed(),
    })
}

/// Whether the graph of admitted edges reaches every node and has no
/// articulation point.
///
/// Asymmetric problems are read as undirected: `{i, j}` is present when
/// either direction is admitted.
pub fn biconnected(problem: &dyn Problem, window: Window) -> bool {
    let n = problem.size();
    let symmetric = problem.is_symmetric();
    let adjacent = |u: usize, v: usize| {
        window.admits(problem.cost(u, v)) || (!symmetric && window.admits(problem.cost(v, u)))
    };

    let mut depth = vec![UNVISITED; n];
    let mut low = vec![0; n];
    let mut parent = vec![UNVISITED; n];
    let mut root_children = 0;
    let mut visited = 1;

    depth[0] = 0;
    // (node, next neighbour candidate)
    let mut stack = vec![(0usize, 0usize)];

    while let Some(top) = stack.last_mut() {
        let u = top.0;
        if top.1 < n {
            let v = top.1;
            top.1 += 1;
            if v == u || !adjacent(u, v) {
                continue;
            }

            if depth[v] == UNVISITED {
                depth[v] = depth[u] + 1;
                low[v] = depth[v];
                parent[v] = u;
                visited += 1;
                if u == 0 {
                    root_children += 1;
                    if root_children > 1 {
                        return false;
                    }
                }
                stack.push((v, 0));
            } else if v != parent[u] {
                low[u] = low[u].min(depth[v]);
            }
            continue;
        }

        stack.pop();
        if let Some(&(p, _)) = stack.last() {
            low[p] = low[p].min(low[u]);
            if p != 0 && low[u] >= depth[p] {
                return false;
            }
        }
    }

    visited == n
}
