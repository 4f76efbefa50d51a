//! The population density field steering growth. A deterministic function of
//! (point, seed): three coherent-noise samples at different offsets and
//! scales, combined so that broad high-density blobs emerge with sharper
//! local variation inside them.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::Rng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use geom::{Line, Pt2D};

#[derive(Serialize, Deserialize)]
pub struct Heatmap {
    /// Two integers drawn once at construction; the only per-run state.
    offset: (i32, i32),
    #[serde(skip, default = "simplex")]
    noise: FastNoiseLite,
}

/// All seeding lives in the coordinate offsets, so the noise primitive itself
/// is fixed and can be rebuilt after deserialization.
fn simplex() -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(0);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(1.0));
    noise
}

impl Clone for Heatmap {
    fn clone(&self) -> Heatmap {
        Heatmap {
            offset: self.offset,
            noise: simplex(),
        }
    }
}

impl Heatmap {
    pub fn new(rng: &mut XorShiftRng) -> Heatmap {
        Heatmap {
            offset: (rng.gen_range(-100_000..100_000), rng.gen_range(-100_000..100_000)),
            noise: simplex(),
        }
    }

    /// Density at a point, roughly in `[0, 1]` (the squared combination can
    /// slightly exceed 1 where all three samples peak together).
    pub fn at_point(&self, pt: Pt2D) -> f64 {
        let x = pt.x() + f64::from(self.offset.0);
        let y = pt.y() + f64::from(self.offset.1);

        let v1 = self.sample(x / 10_000.0, y / 10_000.0);
        let v2 = self.sample(x / 20_000.0 + 500.0, y / 20_000.0 + 500.0);
        let v3 = self.sample(x / 20_000.0 + 1_000.0, y / 20_000.0 + 1_000.0);

        ((v1 * v2) + v3).powi(2)
    }

    /// Density along a segment: the average of its endpoint densities.
    pub fn at_line(&self, line: &Line) -> f64 {
        (self.at_point(line.pt1()) + self.at_point(line.pt2())) / 2.0
    }

    /// One noise sample remapped from [-1, 1] to [0, 1].
    fn sample(&self, x: f64, y: f64) -> f64 {
        (f64::from(self.noise.get_noise_2d(x as f32, y as f32)) + 1.0) / 2.0
    }
}
