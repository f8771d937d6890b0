//! Bottleneck assignment.
//!
//! The assignment question is a unit-capacity flow from a source through row
//! nodes and column nodes to a sink, which is a bipartite matching. It is
//! solved with layered shortest-augmenting-path phases and, once the phase
//! budget is spent, plain Ford–Fulkerson augmentation.

use std::{collections::VecDeque, time::Instant};

use super::{BoundResult, threshold_search};
use crate::{Result, cost_index::CostIndex, problem::Problem, window::Window};

const NONE: usize = usize::MAX;

#[btsp_derive::timer("bap.solve")]
pub fn solve(problem: &dyn Problem, index: &CostIndex) -> Result<BoundResult> {
    let started = Instant::now();
    let objective = threshold_search(index, |window| has_assignment(problem, window));
    log::debug!("bap.solve: n={} objective={objective}", problem.size());

    Ok(BoundResult {
        objective,
        elapsed: started.elapsed(),
    })
}

/// Whether every row can be assigned a distinct column `j != i` through an
/// admitted edge.
pub fn has_assignment(problem: &dyn Problem, window: Window) -> bool {
    let n = problem.size();
    let adjacency: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i && window.admits(problem.cost(i, j)))
                .collect()
        })
        .collect();
    if adjacency.iter().any(Vec::is_empty) {
        return false;
    }

    Matching::new(&adjacency).maximum() == n
}

struct Matching<'a> {
    adjacency: &'a [Vec<usize>],
    row_match: Vec<usize>,
    col_match: Vec<usize>,
}

impl<'a> Matching<'a> {
    fn new(adjacency: &'a [Vec<usize>]) -> Self {
        let n = adjacency.len();
        Self {
            adjacency,
            row_match: vec![NONE; n],
            col_match: vec![NONE; n],
        }
    }

    fn maximum(mut self) -> usize {
        let n = self.adjacency.len();
        let phase_limit = 2 * (n as f64).sqrt() as usize + 2;
        let mut matched = 0;

        for _ in 0..phase_limit {
            let Some(layers) = self.layers() else {
                return matched;
            };
            let mut seen = vec![false; n];
            let mut gained = 0;
            for row in 0..n {
                if self.row_match[row] == NONE && self.augment(row, &mut seen, Some(&layers)) {
                    gained += 1;
                }
            }
            if gained == 0 {
                return matched;
            }
            matched += gained;
        }

        for row in 0..n {
            if self.row_match[row] == NONE {
                let mut seen = vec![false; n];
                if self.augment(row, &mut seen, None) {
                    matched += 1;
                }
            }
        }

        matched
    }

    /// BFS distances over rows from the free rows. `None` when no augmenting
    /// path exists.
    fn layers(&self) -> Option<Vec<usize>> {
        let n = self.adjacency.len();
        let mut dist = vec![NONE; n];
        let mut queue = VecDeque::new();
        for row in 0..n {
            if self.row_match[row] == NONE {
                dist[row] = 0;
                queue.push_back(row);
            }
        }

        let mut reaches_free_column = false;
        while let Some(row) = queue.pop_front() {
            for &col in &self.adjacency[row] {
                let next = self.col_match[col];
                if next == NONE {
                    reaches_free_column = true;
                } else if dist[next] == NONE {
                    dist[next] = dist[row] + 1;
                    queue.push_back(next);
                }
            }
        }

        reaches_free_column.then_some(dist)
    }

    /// Depth-first search for an augmenting path from a free row, flipping
    /// it on success. With `layers`, only steps one BFS layer deeper.
    fn augment(&mut self, start: usize, seen: &mut [bool], layers: Option<&[usize]>) -> bool {
        let mut via = vec![NONE; self.adjacency.len()];
        let mut stack = vec![(start, 0usize)];

        while let Some(top) = stack.last_mut() {
            let row = top.0;
            let Some(&col) = self.adjacency[row].get(top.1) else {
                stack.pop();
                continue;
            };
            top.1 += 1;

            if seen[col] {
                continue;
            }
            let next = self.col_match[col];
            if let Some(dist) = layers
                && next != NONE
                && dist[next] != dist[row].saturating_add(1)
            {
                continue;
            }

            seen[col] = true;
            via[col] = row;
            if next == NONE {
                self.flip(start, col, &via);
                return true;
            }
            stack.push((next, 0));
        }

        false
    }

    fn flip(&mut self, start: usize, free_col: usize, via: &[usize]) {
        let mut col = free_col;
        loop {
            let row = via[col];
            let previous = self.row_match[row];
            self.row_match[row] = col;
            self.col_match[col] = row;
            if row == start {
                break;
            }
            col = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{has_assignment, solve};
    use crate::{cost_index::CostIndex, fixtures::five_node, problem::MatrixProblem, window::Window};

    fn four_by_four() -> MatrixProblem {
        MatrixProblem::from_rows(vec![
            vec![0, 1, 9, 9],
            vec![1, 0, 9, 9],
            vec![9, 9, 0, 7],
            vec![9, 9, 3, 0],
        ])
        .expect("valid matrix")
    }

    #[test]
    fn assignment_needs_seven_on_four_by_four() {
        let problem = four_by_four();
        let index = CostIndex::build(&problem, false).expect("index");

        let bound = solve(&problem, &index).expect("bap");
        assert_eq!(bound.objective, 7);

        for &cost in index.costs().iter().filter(|&&c| c < 7) {
            assert!(!has_assignment(&problem, Window::ceiling(cost)));
        }
    }

    #[test]
    fn assignment_respects_window_floor() {
        let problem = four_by_four();
        assert!(has_assignment(&problem, Window::new(1, 7)));
        assert!(!has_assignment(&problem, Window::new(3, 7)));
    }

    #[test]
    fn augmenting_paths_reassign_earlier_rows() {
        // Row 0 grabs column 1 first; row 2 can only use column 1, so the
        // search must move row 0 to column 2.
        let problem = MatrixProblem::from_rows(vec![
            vec![0, 1, 1],
            vec![1, 0, 5],
            vec![5, 1, 0],
        ])
        .expect("valid matrix");
        assert!(has_assignment(&problem, Window::ceiling(1)));
    }

    #[test]
    fn five_node_assignment_bound_is_below_tour_bound() {
        let problem = five_node();
        let index = CostIndex::build(&problem, true).expect("index");
        let bound = solve(&problem, &index).expect("bap");
        assert!(bound.objective <= 4);
    }
}
