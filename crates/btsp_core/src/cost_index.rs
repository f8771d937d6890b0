//! Sorted distinct edge costs of a problem with rank lookup.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::{
    Error, Result,
    problem::{Cost, Problem},
};

/// Strictly increasing list of the distinct off-diagonal costs of a problem.
///
/// Symmetric problems contribute their upper triangle only. The optional
/// hash gives O(1) [`CostIndex::rank`] and always agrees with the binary
/// search.
#[derive(Clone, Debug)]
pub struct CostIndex {
    costs: Vec<Cost>,
    ranks: Option<HashMap<Cost, usize>>,
}

impl CostIndex {
    pub fn build(problem: &dyn Problem, with_hash: bool) -> Result<Self> {
        let n = problem.size();
        let symmetric = problem.is_symmetric();

        let mut costs: Vec<Cost> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                let first = if symmetric { i + 1 } else { 0 };
                (first..n)
                    .filter(move |&j| j != i)
                    .map(move |j| problem.cost(i, j))
            })
            .collect();
        if costs.is_empty() {
            return Err(Error::invalid_input(format!(
                "Problem with {n} nodes has no edges"
            )));
        }

        costs.par_sort_unstable();
        costs.dedup();

        let ranks = with_hash.then(|| {
            costs
                .iter()
                .enumerate()
                .map(|(rank, &cost)| (cost, rank))
                .collect()
        });

        log::debug!(
            "cost_index.build: n={n} distinct={} min={} max={} hash={with_hash}",
            costs.len(),
            costs[0],
            costs[costs.len() - 1]
        );

        Ok(Self { costs, ranks })
    }

    pub fn costs(&self) -> &[Cost] {
        &self.costs
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn min(&self) -> Cost {
        self.costs[0]
    }

    pub fn max(&self) -> Cost {
        self.costs[self.costs.len() - 1]
    }

    pub fn last_rank(&self) -> usize {
        self.costs.len() - 1
    }

    pub fn get(&self, rank: usize) -> Option<Cost> {
        self.costs.get(rank).copied()
    }

    pub fn has_hash(&self) -> bool {
        self.ranks.is_some()
    }

    /// Exact position of `cost`, `None` when the cost is not in the problem.
    pub fn rank(&self, cost: Cost) -> Option<usize> {
        match &self.ranks {
            Some(ranks) => ranks.get(&cost).copied(),
            None => self.costs.binary_search(&cost).ok(),
        }
    }

    /// Largest rank whose cost is `<= cost`.
    pub fn floor_rank(&self, cost: Cost) -> Option<usize> {
        if let Some(rank) = self.rank(cost) {
            return Some(rank);
        }
        self.costs.partition_point(|&c| c <= cost).checked_sub(1)
    }

    /// Smallest rank whose cost is `>= cost`.
    pub fn ceil_rank(&self, cost: Cost) -> Option<usize> {
        let rank = self.costs.partition_point(|&c| c < cost);
        (rank < self.costs.len()).then_some(rank)
    }
}
