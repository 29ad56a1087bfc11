use std::fmt;

use serde::{Deserialize, Serialize};

/// A dot on the grid. An M×N game has (M+1)×(N+1) dots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn add(self, dx: i32, dy: i32) -> Self {
        Point {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Bounds check: x runs along the N axis, y along the M axis.
    pub fn in_bounds(self, m: i32, n: i32) -> bool {
        self.x >= 0 && self.x <= n && self.y >= 0 && self.y <= m
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

/// An edge between two adjacent dots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub from: Point,
    pub to: Point,
}

impl Line {
    pub fn new(from: Point, to: Point) -> Self {
        Line { from, to }
    }

    /// Canonical form: endpoints sorted by (x, y), so the same geometric
    /// line always produces the same key no matter which endpoint the
    /// client sent first.
    pub fn ordered(self) -> Self {
        if self.from > self.to {
            Line {
                from: self.to,
                to: self.from,
            }
        } else {
            self
        }
    }

    /// Both endpoints in bounds and exactly one unit apart on one axis.
    pub fn is_valid(self, m: i32, n: i32) -> bool {
        if !self.from.in_bounds(m, n) || !self.to.in_bounds(m, n) {
            return false;
        }
        let dx = self.from.x - self.to.x;
        let dy = self.from.y - self.to.y;
        dx.abs() + dy.abs() == 1
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from-{}-to-{}", self.from, self.to)
    }
}

/// The four canonical edges of the unit box whose top-left corner is `origin`.
pub fn edges_of(origin: Point) -> [Line; 4] {
    let top_left = origin;
    let top_right = origin.add(1, 0);
    let bottom_right = top_right.add(0, 1);
    let bottom_left = top_left.add(0, 1);
    [
        Line::new(top_left, top_right).ordered(),
        Line::new(top_right, bottom_right).ordered(),
        Line::new(bottom_left, bottom_right).ordered(),
        Line::new(top_left, bottom_left).ordered(),
    ]
}

/// Every origin in the dots grid, boundary rows included. Origins on the
/// far row/column can never collect four in-bounds edges, so completion
/// counts stay comparable against M*N.
pub fn all_box_origins(m: i32, n: i32) -> Vec<Point> {
    let mut origins = Vec::with_capacity(((m + 1) * (n + 1)) as usize);
    for y in 0..=m {
        for x in 0..=n {
            origins.push(Point::new(x, y));
        }
    }
    origins
}
