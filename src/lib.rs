//! Procedural voxel terrain library
//!
//! Noise planes are carved into density stacks, sliced into chunks and
//! triangulated with marching cubes. Connector volumes stitch the seams
//! between neighbouring chunks.

pub mod config;
pub mod curve;
pub mod error;
pub mod field;
pub mod mesh;
pub mod noise_field;
pub mod seeds;
pub mod terrain;
pub mod volume;

pub use config::{MeshFidelity, NoiseAlgorithm, TerrainConfig, TerrainPreset};
pub use error::{Result, TerrainError};
pub use terrain::{generate, BuildPhase, BuildStats, Terrain, TerrainBuild};
