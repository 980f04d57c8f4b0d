//! Height-plane generation
//!
//! Two interchangeable generators produce the same output, a square
//! [`ScalarField2D`] per chunk column:
//! - **Fractal**: octave-summed smooth noise
//! - **Diamond-square**: midpoint displacement seeded from the fractal field

pub mod context;
pub mod diamond_square;
pub mod fractal;

pub use context::{
    NoiseContext, NoiseSettings, OctaveOffset, OctaveSchedule, MIN_NOISE_SCALE,
    OCTAVE_OFFSET_RANGE,
};
pub use diamond_square::Displacement;

use crate::config::{NoiseAlgorithm, TerrainConfig};
use crate::error::Result;
use crate::field::ScalarField2D;
use crate::seeds::column_seed;

/// Generate the height plane of chunk column `(cx, cz)`.
pub fn generate_plane(config: &TerrainConfig, column: (i32, i32)) -> Result<ScalarField2D> {
    let size = config.nodes_per_axis;
    let settings = NoiseSettings::from_config(config);
    let manual_offset = [
        column.0 as f64 * size as f64,
        column.1 as f64 * size as f64,
    ];

    match config.algorithm {
        NoiseAlgorithm::Fractal => Ok(fractal::generate(size, &settings, manual_offset)),
        NoiseAlgorithm::DiamondSquare { roughness, falloff } => {
            let displacement = Displacement {
                roughness,
                falloff,
                seed: column_seed(config.seed, "displacement", column),
            };
            diamond_square::generate(size, &settings, manual_offset, displacement)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_has_chunk_size() {
        let config = TerrainConfig::default();
        let plane = generate_plane(&config, (1, -1)).unwrap();
        assert_eq!(plane.width, config.nodes_per_axis);
        assert_eq!(plane.height, config.nodes_per_axis);
    }

    #[test]
    fn test_columns_differ() {
        let config = TerrainConfig { noise_scale: 7.5, ..TerrainConfig::default() };
        let a = generate_plane(&config, (0, 0)).unwrap();
        let b = generate_plane(&config, (1, 0)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_diamond_square_dispatch_checks_size() {
        let algorithm = NoiseAlgorithm::DiamondSquare { roughness: 0.2, falloff: 0.5 };
        let ok = TerrainConfig { nodes_per_axis: 9, algorithm, ..TerrainConfig::default() };
        assert!(generate_plane(&ok, (0, 0)).is_ok());

        let bad = TerrainConfig { nodes_per_axis: 6, algorithm, ..TerrainConfig::default() };
        assert!(generate_plane(&bad, (0, 0)).is_err());
    }
}
