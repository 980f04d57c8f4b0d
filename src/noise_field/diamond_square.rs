//! Midpoint displacement ("diamond-square") height planes
//!
//! Operates on `2^n + 1` sized grids:
//! 1. The four corners are seeded from the fractal noise field
//! 2. Diamond pass: each square's centre gets the mean of its 4 corners
//! 3. Square pass: each edge midpoint gets the mean of its (up to 4) neighbours
//! 4. Every new value is displaced by a random amount in `[-roughness, roughness]`,
//!    and roughness is multiplied by `falloff` after each refinement level

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Result, TerrainError};
use crate::field::ScalarField2D;

use super::context::{NoiseContext, NoiseSettings};

/// Parameters specific to midpoint displacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Displacement {
    pub roughness: f32,
    pub falloff: f32,
    /// Seed of the displacement stream (independent of the octave offsets)
    pub seed: u64,
}

pub fn generate(
    size: usize,
    settings: &NoiseSettings,
    manual_offset: [f64; 2],
    displacement: Displacement,
) -> Result<ScalarField2D> {
    if size < 2 || !(size - 1).is_power_of_two() {
        return Err(TerrainError::InvalidDimension {
            what: "diamond-square size",
            value: size,
            reason: "size - 1 must be a power of two",
        });
    }

    let ctx = NoiseContext::new(settings, manual_offset);
    let mut rng = ChaCha8Rng::seed_from_u64(displacement.seed);
    let mut plane = ScalarField2D::square(size);
    let last = size - 1;

    for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
        plane.set(x, y, ctx.sample(x as f64, y as f64));
    }

    let mut roughness = displacement.roughness;
    let mut step = last;
    while step > 1 {
        let half = step / 2;

        // Diamond pass
        for y in (half..size).step_by(step) {
            for x in (half..size).step_by(step) {
                let mean = (plane.get(x - half, y - half)
                    + plane.get(x + half, y - half)
                    + plane.get(x - half, y + half)
                    + plane.get(x + half, y + half))
                    / 4.0;
                plane.set(x, y, mean + displace(&mut rng, roughness));
            }
        }

        // Square pass: rows alternate between starting at `half` and at 0
        for y in (0..size).step_by(half) {
            let x_start = if (y / half) % 2 == 0 { half } else { 0 };
            for x in (x_start..size).step_by(step) {
                let mean = square_mean(&plane, x, y, half);
                plane.set(x, y, mean + displace(&mut rng, roughness));
            }
        }

        roughness *= displacement.falloff;
        step = half;
    }

    Ok(plane)
}

/// Mean of the in-bounds axis neighbours `half` away.
fn square_mean(plane: &ScalarField2D, x: usize, y: usize, half: usize) -> f32 {
    let size = plane.width;
    let mut sum = 0.0;
    let mut count = 0;

    if x >= half {
        sum += plane.get(x - half, y);
        count += 1;
    }
    if x + half < size {
        sum += plane.get(x + half, y);
        count += 1;
    }
    if y >= half {
        sum += plane.get(x, y - half);
        count += 1;
    }
    if y + half < size {
        sum += plane.get(x, y + half);
        count += 1;
    }

    sum / count as f32
}

#[inline]
fn displace(rng: &mut ChaCha8Rng, roughness: f32) -> f32 {
    if roughness > 0.0 {
        rng.gen_range(-roughness..=roughness)
    } else {
        0.0
    }
}
