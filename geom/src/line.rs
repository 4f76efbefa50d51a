use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Pt2D};

/// A directed line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

/// The result of intersecting the infinite line through one segment with the
/// interior of another. `self_factor` is unbounded; `other_factor` is always
/// strictly inside `(0, 1)`.
#[derive(Clone, Copy, Debug)]
pub struct Crossing {
    pub pt: Pt2D,
    pub self_factor: f64,
    pub other_factor: f64,
}

impl Line {
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> f64 {
        self.0.dist(self.1)
    }

    pub fn angle(&self) -> Angle {
        self.0.angle_to(self.1)
    }

    pub fn middle(&self) -> Pt2D {
        self.percent_along(0.5)
    }

    /// Linear interpolation from pt1 towards pt2. The factor may lie outside
    /// `[0, 1]`.
    pub fn percent_along(&self, factor: f64) -> Pt2D {
        Pt2D::new(
            self.0.x() + factor * (self.1.x() - self.0.x()),
            self.0.y() + factor * (self.1.y() - self.0.y()),
        )
    }

    /// Intersect the infinite line through `self` with `other`'s interior.
    /// Parallel lines yield `None`, as does any hit outside `other`'s open
    /// `(0, 1)` span. A `self_factor` past 1 means `self` would have to be
    /// extended to reach the crossing; callers use that for extend-snapping.
    pub fn unbounded_crossing(&self, other: &Line) -> Option<Crossing> {
        let r = (self.1.x() - self.0.x(), self.1.y() - self.0.y());
        let s = (other.1.x() - other.0.x(), other.1.y() - other.0.y());
        let q_minus_p = (other.0.x() - self.0.x(), other.0.y() - self.0.y());

        let denominator = cross(r, s);
        if denominator == 0.0 {
            return None;
        }
        let self_factor = cross(q_minus_p, s) / denominator;
        let other_factor = cross(q_minus_p, r) / denominator;

        if other_factor <= 0.0 || other_factor >= 1.0 {
            return None;
        }
        Some(Crossing {
            pt: self.percent_along(self_factor),
            self_factor,
            other_factor,
        })
    }
}

fn cross(v1: (f64, f64), v2: (f64, f64)) -> f64 {
    v1.0 * v2.1 - v1.1 * v2.0
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({} to {})", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_crossing() {
        // Vertical through (5, -5)..(5, 5), horizontal through (0, 0)..(10, 0).
        let horiz = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let vert = Line::new(Pt2D::new(5.0, -5.0), Pt2D::new(5.0, 5.0));

        let hit = horiz.unbounded_crossing(&vert).unwrap();
        assert!(hit.pt.approx_eq(Pt2D::new(5.0, 0.0)));
        assert!((hit.self_factor - 0.5).abs() < 1e-9);
        assert!((hit.other_factor - 0.5).abs() < 1e-9);
    }

    #[test]
    fn crossing_past_the_end() {
        // The other line is only reachable by extending self past pt2.
        let short = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(4.0, 0.0));
        let vert = Line::new(Pt2D::new(8.0, -1.0), Pt2D::new(8.0, 1.0));

        let hit = short.unbounded_crossing(&vert).unwrap();
        assert!((hit.self_factor - 2.0).abs() < 1e-9);
        assert!(hit.pt.approx_eq(Pt2D::new(8.0, 0.0)));
    }

    #[test]
    fn parallel_lines_never_cross() {
        let l1 = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let l2 = Line::new(Pt2D::new(0.0, 1.0), Pt2D::new(10.0, 1.0));
        assert!(l1.unbounded_crossing(&l2).is_none());
    }

    #[test]
    fn hit_outside_other_interior() {
        let horiz = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        // The infinite horizontal line passes below this one entirely.
        let above = Line::new(Pt2D::new(3.0, 1.0), Pt2D::new(7.0, 5.0));
        assert!(horiz.unbounded_crossing(&above).is_none());
    }
}
