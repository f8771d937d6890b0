use super::Transform;
use crate::{
    problem::{Cost, MatrixProblem, Problem},
    window::Window,
};

/// Shallow transform: every lookup goes through the base problem.
pub struct TransformedView<'a> {
    base: &'a dyn Problem,
    transform: &'a Transform,
    window: Window,
}

impl<'a> TransformedView<'a> {
    pub(crate) fn new(base: &'a dyn Problem, transform: &'a Transform, window: Window) -> Self {
        Self {
            base,
            transform,
            window,
        }
    }
}

impl Problem for TransformedView<'_> {
    fn size(&self) -> usize {
        self.base.size()
    }

    fn is_symmetric(&self) -> bool {
        self.base.is_symmetric()
    }

    fn cost(&self, i: usize, j: usize) -> Cost {
        self.transform.cost(self.base, self.window, i, j)
    }

    fn fixed_edges(&self) -> usize {
        self.base.fixed_edges()
    }
}

/// Result of applying a transform: a borrowed view or a materialized matrix.
pub enum DerivedProblem<'a> {
    View(TransformedView<'a>),
    Owned(MatrixProblem),
}

impl DerivedProblem<'_> {
    pub fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    fn inner(&self) -> &dyn Problem {
        match self {
            Self::View(view) => view,
            Self::Owned(matrix) => matrix,
        }
    }
}

impl Problem for DerivedProblem<'_> {
    fn size(&self) -> usize {
        self.inner().size()
    }

    fn is_symmetric(&self) -> bool {
        self.inner().is_symmetric()
    }

    fn cost(&self, i: usize, j: usize) -> Cost {
        self.inner().cost(i, j)
    }

    fn fixed_edges(&self) -> usize {
        self.inner().fixed_edges()
    }
}
