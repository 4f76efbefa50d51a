mod angle;
mod line;
mod pt;

pub use crate::angle::Angle;
pub use crate::line::{Crossing, Line};
pub use crate::pt::Pt2D;

/// Reduce the precision of an f64. This helps ensure serialization is
/// bitwise deterministic and gives exact comparisons a chance to succeed
/// after a chain of floating-point arithmetic.
pub fn trim_f64(x: f64) -> f64 {
    (x * 100_000.0).round() / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimming() {
        assert_eq!(trim_f64(1.000001), 1.0);
        assert_eq!(trim_f64(1.00002), 1.00002);
        assert_eq!(trim_f64(-0.0000049), 0.0);
    }
}
