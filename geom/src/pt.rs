use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{trim_f64, Angle};

/// A point in world-space. The generator grows over an unbounded plane, so
/// negative coordinates are fine.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn dist(self, other: Pt2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    /// Walk `dist` from this point along `theta`.
    pub fn project_away(self, dist: f64, theta: Angle) -> Pt2D {
        let (sin, cos) = theta.normalized_radians().sin_cos();
        Pt2D::new(self.x + dist * cos, self.y + dist * sin)
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::new_rads((to.y - self.y).atan2(to.x - self.x))
    }

    /// Equality after trimming both coordinates, absorbing floating-point
    /// noise from intersection arithmetic.
    pub fn approx_eq(self, other: Pt2D) -> bool {
        trim_f64(self.x) == trim_f64(other.x) && trim_f64(self.y) == trim_f64(other.y)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}
