//! Constrained bottleneck spanning tree.
//!
//! Dropping the longest edge of a tour leaves a spanning path, so the
//! minimum spanning tree is both a length certificate for the budget and,
//! through its longest edge, a lower bound on the bottleneck. A minimum
//! spanning tree also minimizes its longest edge, so no threshold search is
//! needed.

use std::time::Instant;

use super::BoundResult;
use crate::{
    Error, Result,
    problem::{Cost, Problem},
};

const NONE: usize = usize::MAX;

/// A spanning tree as `(parent, child, cost)` edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanningTree {
    pub edges: Vec<(usize, usize, Cost)>,
}

impl SpanningTree {
    pub fn length(&self) -> Cost {
        self.edges.iter().map(|&(_, _, cost)| cost).sum()
    }

    pub fn bottleneck(&self) -> Option<Cost> {
        self.edges.iter().map(|&(_, _, cost)| cost).max()
    }
}

#[btsp_derive::timer("cbst.solve")]
pub fn solve(problem: &dyn Problem, max_length: Cost) -> Result<BoundResult> {
    let started = Instant::now();
    let tree = minimum_spanning_tree(problem);
    let Some(objective) = tree.bottleneck() else {
        return Err(Error::invalid_input("CBST needs at least one edge"));
    };
    if tree.length() > max_length {
        return Err(Error::invalid_input(format!(
            "Max length {max_length} is infeasible: the minimum spanning tree has length {}",
            tree.length()
        )));
    }
    log::debug!(
        "cbst.solve: n={} max_length={max_length} tree_length={} objective={objective}",
        problem.size(),
        tree.length()
    );

    Ok(BoundResult {
        objective,
        elapsed: started.elapsed(),
    })
}

/// Dense Prim from node 0. Directed problems are read as undirected with
/// the cheaper direction of each pair.
pub fn minimum_spanning_tree(problem: &dyn Problem) -> SpanningTree {
    let n = problem.size();
    let symmetric = problem.is_symmetric();
    let edge_cost = |u: usize, v: usize| {
        if symmetric {
            problem.cost(u, v)
        } else {
            problem.cost(u, v).min(problem.cost(v, u))
        }
    };

    let mut in_tree = vec![false; n];
    let mut best: Vec<Option<Cost>> = vec![None; n];
    let mut parent = vec![NONE; n];
    let mut tree = SpanningTree::default();
    let mut next = 0;
    for _ in 0..n {
        let u = next;
        in_tree[u] = true;
        if parent[u] != NONE
            && let Some(cost) = best[u]
        {
            tree.edges.push((parent[u], u, cost));
        }

        let mut closest: Option<(Cost, usize)> = None;
        for v in (0..n).filter(|&v| !in_tree[v]) {
            let cost = edge_cost(u, v);
            if best[v].is_none_or(|b| cost < b) {
                best[v] = Some(cost);
                parent[v] = u;
            }
            if let Some(b) = best[v]
                && closest.is_none_or(|(c, _)| b < c)
            {
                closest = Some((b, v));
            }
        }
        match closest {
            Some((_, v)) => next = v,
            None => break,
        }
    }

    tree
}
