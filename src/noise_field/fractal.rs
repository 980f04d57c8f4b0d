//! Fractal (octave-summed) height planes

use crate::field::ScalarField2D;

use super::context::{NoiseContext, NoiseSettings};

/// Generate a `size × size` plane of fractal noise.
///
/// `manual_offset` is the plane's world `(x, z)` origin.
pub fn generate(size: usize, settings: &NoiseSettings, manual_offset: [f64; 2]) -> ScalarField2D {
    let ctx = NoiseContext::new(settings, manual_offset);
    generate_with(size, &ctx)
}

/// Generate a plane from an existing context.
pub fn generate_with(size: usize, ctx: &NoiseContext) -> ScalarField2D {
    let mut plane = ScalarField2D::square(size);
    for y in 0..size {
        for x in 0..size {
            plane.set(x, y, ctx.sample(x as f64, y as f64));
        }
    }
    plane
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(octaves: u32) -> NoiseSettings {
        NoiseSettings {
            seed: 42,
            noise_scale: 50.0,
            octaves,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(16, &settings(6), [32.0, -16.0]);
        let b = generate(16, &settings(6), [32.0, -16.0]);
        let bits_a: Vec<u32> = a.as_slice().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u32> = b.as_slice().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn test_single_octave_reproduces() {
        // persistence and lacunarity never apply with one octave
        let a = generate(8, &settings(1), [0.0, 0.0]);
        let b = generate(8, &NoiseSettings { persistence: 0.9, lacunarity: 7.0, ..settings(1) }, [0.0, 0.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_octave_is_bounded() {
        let plane = generate(32, &settings(1), [0.0, 0.0]);
        let (min, max) = plane.min_max().unwrap();
        assert!(min >= -1.0 && max <= 1.0);
        assert!(max > min, "plane should not be constant");
    }

    #[test]
    fn test_octaves_bound_by_amplitude_sum() {
        let plane = generate(16, &settings(4), [0.0, 0.0]);
        let bound = 1.0 + 0.5 + 0.25 + 0.125;
        for (_, _, v) in plane.iter() {
            assert!(v.abs() <= bound + 1e-5);
        }
    }

    #[test]
    fn test_manual_offset_continues_the_field() {
        let origin = generate(8, &settings(3), [0.0, 0.0]);
        let shifted = generate(8, &settings(3), [3.0, 2.0]);
        for y in 0..6 {
            for x in 0..5 {
                assert!((shifted.get(x, y) - origin.get(x + 3, y + 2)).abs() < 1e-4);
            }
        }
    }
}
