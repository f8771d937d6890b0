use std::fmt::{Display, Formatter};

use crate::problem::Cost;

/// Closed cost interval `[min, max]` an edge must fall in to be "active".
///
/// Plain bottleneck checks use [`Window::ceiling`], which has no lower end.
/// Fixed (negative) edges are admitted by every window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub min: Cost,
    pub max: Cost,
}

impl Window {
    pub fn new(min: Cost, max: Cost) -> Self {
        Self { min, max }
    }

    pub fn ceiling(max: Cost) -> Self {
        Self {
            min: Cost::MIN,
            max,
        }
    }

    pub fn contains(&self, cost: Cost) -> bool {
        self.min <= cost && cost <= self.max
    }

    pub fn admits(&self, cost: Cost) -> bool {
        cost < 0 || self.contains(cost)
    }

    pub fn has_floor(&self) -> bool {
        self.min != Cost::MIN
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.has_floor() {
            write!(f, "[{},{}]", self.min, self.max)
        } else {
            write!(f, "<={}", self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Window;

    #[test]
    fn fixed_edges_pass_every_window() {
        let window = Window::new(3, 5);
        assert!(window.admits(-10));
        assert!(window.admits(3));
        assert!(!window.admits(2));
        assert!(!window.admits(6));
    }

    #[test]
    fn ceiling_has_no_floor() {
        let window = Window::ceiling(4);
        assert!(window.contains(0));
        assert!(!window.contains(5));
        assert_eq!(window.to_string(), "<=4");
        assert_eq!(Window::new(1, 2).to_string(), "[1,2]");
    }
}
