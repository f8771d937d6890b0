//! Cost-matrix problems and tour helpers.
//!
//! A [`Problem`] is a read-only `n x n` integer cost lookup. Negative costs are
//! reserved for the "fixed" pairing edges of [`DoubledProblem`]; every other
//! problem carries non-negative costs.

mod distance;
mod doubled;

pub use distance::{Coord, DistanceKind};
pub use doubled::DoubledProblem;

use crate::{Error, Result};

/// Edge cost. Signed so fixed edges can be negative.
pub type Cost = i64;

pub trait Problem: Sync {
    fn size(&self) -> usize;

    fn is_symmetric(&self) -> bool;

    /// Cost of the edge `i -> j`. Must be deterministic.
    fn cost(&self, i: usize, j: usize) -> Cost;

    /// Number of negative "fixed" edges every valid tour must use.
    fn fixed_edges(&self) -> usize {
        0
    }
}

impl<P: Problem + ?Sized> Problem for &P {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn is_symmetric(&self) -> bool {
        (**self).is_symmetric()
    }

    fn cost(&self, i: usize, j: usize) -> Cost {
        (**self).cost(i, j)
    }

    fn fixed_edges(&self) -> usize {
        (**self).fixed_edges()
    }
}

/// Owned row-major cost matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixProblem {
    size: usize,
    symmetric: bool,
    fixed_edges: usize,
    costs: Vec<Cost>,
}

impl MatrixProblem {
    /// Builds a problem from square rows. Symmetry is detected.
    pub fn from_rows(rows: Vec<Vec<Cost>>) -> Result<Self> {
        let size = rows.len();
        if size < 2 {
            return Err(Error::invalid_input(format!(
                "A problem needs at least 2 nodes, got {size}"
            )));
        }

        let mut costs = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(Error::invalid_input(format!(
                    "Row {i} has {} entries, expected {size}",
                    row.len()
                )));
            }
            costs.extend(row);
        }

        let symmetric = (0..size)
            .all(|i| (i + 1..size).all(|j| costs[i * size + j] == costs[j * size + i]));
        Ok(Self {
            size,
            symmetric,
            fixed_edges: 0,
            costs,
        })
    }

    /// Builds a problem by evaluating `cost(i, j)` for every ordered pair.
    pub fn from_fn(size: usize, symmetric: bool, cost: impl Fn(usize, usize) -> Cost) -> Self {
        let mut costs = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                costs.push(cost(i, j));
            }
        }
        Self {
            size,
            symmetric,
            fixed_edges: 0,
            costs,
        }
    }

    /// Copies any problem into owned storage.
    pub fn materialize(problem: &dyn Problem) -> Self {
        let mut owned = Self::from_fn(problem.size(), problem.is_symmetric(), |i, j| {
            problem.cost(i, j)
        });
        owned.fixed_edges = problem.fixed_edges();
        owned
    }

    pub fn with_fixed_edges(mut self, fixed_edges: usize) -> Self {
        self.fixed_edges = fixed_edges;
        self
    }

    /// Rows as nested vectors, e.g. for writing a FULL_MATRIX problem file.
    pub fn rows(&self) -> Vec<Vec<Cost>> {
        self.costs.chunks(self.size).map(<[Cost]>::to_vec).collect()
    }
}

impl Problem for MatrixProblem {
    fn size(&self) -> usize {
        self.size
    }

    fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    fn cost(&self, i: usize, j: usize) -> Cost {
        self.costs[i * self.size + j]
    }

    fn fixed_edges(&self) -> usize {
        self.fixed_edges
    }
}

/// Consecutive edges of a closed tour, including the closing edge.
pub fn tour_edges(tour: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let n = tour.len();
    (0..n).map(move |idx| (tour[idx], tour[(idx + 1) % n]))
}

/// Total cost of a closed tour.
pub fn tour_length(problem: &dyn Problem, tour: &[usize]) -> Cost {
    tour_edges(tour).map(|(u, v)| problem.cost(u, v)).sum()
}

/// Largest and smallest non-negative edge cost on a closed tour.
///
/// Fixed (negative) edges are ignored. `None` when the tour has no
/// non-negative edge.
pub fn tour_cost_range(problem: &dyn Problem, tour: &[usize]) -> Option<(Cost, Cost)> {
    tour_edges(tour)
        .map(|(u, v)| problem.cost(u, v))
        .filter(|&c| c >= 0)
        .fold(None, |range, c| match range {
            None => Some((c, c)),
            Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
        })
}

/// Bottleneck (largest non-negative edge cost) of a closed tour.
pub fn tour_bottleneck(problem: &dyn Problem, tour: &[usize]) -> Option<Cost> {
    tour_cost_range(problem, tour).map(|(_, hi)| hi)
}

/// Number of fixed (negative) edges a closed tour uses.
pub fn fixed_edges_used(problem: &dyn Problem, tour: &[usize]) -> usize {
    tour_edges(tour)
        .filter(|&(u, v)| problem.cost(u, v) < 0)
        .count()
}

/// Checks that `tour` visits each of the `size` nodes exactly once.
pub fn validate_tour(size: usize, tour: &[usize]) -> Result<()> {
    if tour.len() != size {
        return Err(Error::invalid_data(format!(
            "Tour has {} nodes, expected {size}",
            tour.len()
        )));
    }

    let mut seen = vec![false; size];
    for &node in tour {
        if node >= size {
            return Err(Error::invalid_data(format!(
                "Tour node {node} is out of range for {size} nodes"
            )));
        }
        if seen[node] {
            return Err(Error::invalid_data(format!("Tour visits node {node} twice")));
        }
        seen[node] = true;
    }

    Ok(())
}
