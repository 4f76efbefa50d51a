use std::f64;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in degrees and normalized to `[0, 360)`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.rem_euclid(360.0))
    }

    pub fn new_rads(rads: f64) -> Angle {
        Angle::degrees(rads.to_degrees())
    }

    /// The reverse direction.
    pub fn opposite(self) -> Angle {
        Angle::degrees(self.0 + 180.0)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle::degrees(self.0 + degrees)
    }

    pub fn normalized_degrees(self) -> f64 {
        self.0
    }

    pub fn normalized_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// The symmetric smallest difference between two directions, in
    /// `[0, 180]`. Order doesn't matter.
    pub fn shortest_diff(self, other: Angle) -> f64 {
        let diff = (self.0 - other.0).abs();
        diff.min((diff - 360.0).abs())
    }

    /// Counter-clockwise rotation from `other` to `self`, in `[0, 360)`.
    pub fn ccw_diff(self, other: Angle) -> f64 {
        (self.0 - other.0).rem_euclid(360.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.0)
    }
}
