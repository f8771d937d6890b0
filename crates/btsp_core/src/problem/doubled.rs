use super::{Cost, Problem};
use crate::{Error, Result};

/// Symmetric `2n`-node view of an asymmetric `n`-node problem.
///
/// Node `i` keeps its outgoing arcs and node `i + n` stands in for its
/// incoming arcs. The pair `(i, i + n)` is joined by a fixed edge of cost
/// `-infinity`, pairs on the same side cost `+infinity`, and `(j, i + n)`
/// costs the arc `j -> i`. Every finite tour therefore alternates sides and
/// spells out a directed tour of the base problem.
pub struct DoubledProblem<'a> {
    base: &'a dyn Problem,
    infinity: Cost,
}

impl<'a> DoubledProblem<'a> {
    pub fn new(base: &'a dyn Problem, infinity: Cost) -> Self {
        Self { base, infinity }
    }

    pub fn base(&self) -> &'a dyn Problem {
        self.base
    }

    pub fn infinity(&self) -> Cost {
        self.infinity
    }

    /// Converts a symmetric tour length into the directed tour length.
    pub fn asymmetric_length(&self, symmetric_length: Cost) -> Cost {
        symmetric_length + self.base.size() as Cost * self.infinity
    }

    /// Maps a `2n`-node tour back onto the directed `n`-node tour.
    ///
    /// Fails when the tour skips any pairing edge.
    pub fn map_tour_back(&self, tour: &[usize]) -> Result<Vec<usize>> {
        let n = self.base.size();
        if tour.len() != 2 * n {
            return Err(Error::invalid_data(format!(
                "Doubled tour has {} nodes, expected {}",
                tour.len(),
                2 * n
            )));
        }

        let pairs_used = super::tour_edges(tour)
            .filter(|&(u, v)| u.max(v) == u.min(v) + n)
            .count();
        if pairs_used != n {
            return Err(Error::invalid_data(format!(
                "Doubled tour uses {pairs_used} of {n} pairing edges"
            )));
        }

        let len = tour.len();
        let Some(start) = tour.iter().position(|&node| node == 0) else {
            return Err(Error::invalid_data("Doubled tour does not visit node 0"));
        };

        // Walk away from the pairing edge so each low node precedes its arc.
        let forward = tour[(start + 1) % len] != n;
        let mut directed = Vec::with_capacity(n);
        for step in 0..len {
            let idx = if forward {
                (start + step) % len
            } else {
                (start + len - step) % len
            };
            if tour[idx] < n {
                directed.push(tour[idx]);
            }
        }

        Ok(directed)
    }
}

impl Problem for DoubledProblem<'_> {
    fn size(&self) -> usize {
        self.base.size() * 2
    }

    fn is_symmetric(&self) -> bool {
        true
    }

    fn cost(&self, i: usize, j: usize) -> Cost {
        if i == j {
            return 0;
        }

        let n = self.base.size();
        let (low, high) = (i.min(j), i.max(j));
        if high < n || low >= n {
            self.infinity
        } else if high == low + n {
            -self.infinity
        } else {
            self.base.cost(low, high - n)
        }
    }

    fn fixed_edges(&self) -> usize {
        self.base.size()
    }
}
