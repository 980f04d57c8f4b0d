//! Terrain generation parameters and configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::curve::{Keyframe, ResponseCurve, DEFAULT_CURVE_SAMPLES};
use crate::error::{Result, TerrainError};

/// How marching cubes places a vertex on a crossing edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshFidelity {
    /// Snap to the edge midpoint regardless of corner values (blocky look)
    #[default]
    Midpoint,
    /// Place the vertex where the linear density crosses the surface level
    Interpolated,
}

/// Height-plane generator.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseAlgorithm {
    /// Octave-summed smooth noise
    #[default]
    Fractal,
    /// Midpoint displacement; needs `nodes_per_axis - 1` to be a power of two
    DiamondSquare {
        /// Displacement amplitude of the first refinement pass
        roughness: f32,
        /// Multiplier applied to `roughness` after every pass (0.0-1.0)
        falloff: f32,
    },
}

/// Named starting points for a configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TerrainPreset {
    /// Low, gently undulating ground
    Flat,
    /// Balanced hills
    #[default]
    Rolling,
    /// Tall, sharp relief
    Mountainous,
}

impl TerrainPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Flat, Self::Rolling, Self::Mountainous]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Flat => "Low, gently undulating ground",
            Self::Rolling => "Balanced hills",
            Self::Mountainous => "Tall, sharp relief",
        }
    }

    pub fn config(&self) -> TerrainConfig {
        let base = TerrainConfig::default();
        match self {
            Self::Flat => TerrainConfig {
                octaves: 2,
                persistence: 0.1,
                noise_scale: 4.0,
                height_multiplier: 8.0,
                ..base
            },
            Self::Rolling => base,
            Self::Mountainous => TerrainConfig {
                octaves: 8,
                persistence: 0.35,
                lacunarity: 2.2,
                noise_scale: 2.0,
                height_multiplier: 96.0,
                curve: ResponseCurve::new(vec![
                    Keyframe::new(0.0, 0.0),
                    Keyframe::with_tangents(0.4, 0.15, 0.5, 0.5),
                    Keyframe::with_tangents(1.0, 1.0, 2.0, 2.0),
                ])
                .unwrap_or_default(),
                ..base
            },
        }
    }
}

impl std::fmt::Display for TerrainPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Rolling => write!(f, "rolling"),
            Self::Mountainous => write!(f, "mountainous"),
        }
    }
}

impl std::str::FromStr for TerrainPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|preset| preset.to_string() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown preset '{}' (expected flat, rolling or mountainous)", s))
    }
}

/// Everything a terrain build reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    // =========================================================================
    // Grid
    // =========================================================================

    /// Density nodes along each axis of a chunk (>= 2)
    pub nodes_per_axis: usize,

    /// Chunks stacked vertically in every column
    pub vertical_chunks: usize,

    /// Columns along x
    pub chunks_x: usize,

    /// Columns along z
    pub chunks_z: usize,

    // =========================================================================
    // Noise
    // =========================================================================

    pub seed: u32,

    /// Feature size in nodes. Values <= 0 are clamped to 1e-4 at generation time.
    pub noise_scale: f32,

    /// Number of octaves (1-10 typical)
    pub octaves: u32,

    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f32,

    /// Frequency multiplier per octave (>= 1.0)
    pub lacunarity: f32,

    pub algorithm: NoiseAlgorithm,

    // =========================================================================
    // Density
    // =========================================================================

    /// Scales curve-shaped noise into node offsets
    pub height_multiplier: f32,

    /// Terrain top before noise is applied; defaults to 3/5 of the stack
    pub base_height: Option<usize>,

    /// Response curve applied to each noise value
    pub curve: ResponseCurve,

    /// Resolution of the baked curve table
    pub curve_samples: usize,

    // =========================================================================
    // Meshing
    // =========================================================================

    /// Density threshold separating solid from air
    pub surface_level: f32,

    pub fidelity: MeshFidelity,

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Worker threads (None = one per core)
    pub threads: Option<usize>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            nodes_per_axis: 5,
            vertical_chunks: 3,
            chunks_x: 4,
            chunks_z: 4,
            seed: 1_972_394_817,
            noise_scale: 1.0,
            octaves: 6,
            persistence: 0.15,
            lacunarity: 2.0,
            algorithm: NoiseAlgorithm::Fractal,
            height_multiplier: 64.0,
            base_height: None,
            curve: ResponseCurve::linear(),
            curve_samples: DEFAULT_CURVE_SAMPLES,
            surface_level: 0.0,
            fidelity: MeshFidelity::Midpoint,
            threads: None,
        }
    }
}

impl TerrainConfig {
    pub fn from_preset(preset: TerrainPreset) -> Self {
        preset.config()
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Nodes in one vertical column of chunks.
    pub fn stack_height(&self) -> usize {
        self.nodes_per_axis * self.vertical_chunks
    }

    pub fn base_height(&self) -> usize {
        self.base_height.unwrap_or(self.stack_height() / 5 * 3)
    }

    pub fn smoothing(&self) -> bool {
        self.fidelity == MeshFidelity::Interpolated
    }

    /// Column indices along x, centred on zero.
    pub fn column_range_x(&self) -> std::ops::Range<i32> {
        centred_range(self.chunks_x)
    }

    /// Column indices along z, centred on zero.
    pub fn column_range_z(&self) -> std::ops::Range<i32> {
        centred_range(self.chunks_z)
    }

    pub fn column_count(&self) -> usize {
        self.chunks_x * self.chunks_z
    }

    pub fn chunk_count(&self) -> usize {
        self.column_count() * self.vertical_chunks
    }

    /// Check every precondition the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.nodes_per_axis < 2 {
            return Err(TerrainError::InvalidDimension {
                what: "nodes_per_axis",
                value: self.nodes_per_axis,
                reason: "a chunk needs at least 2 nodes per axis",
            });
        }
        for (what, value) in [
            ("vertical_chunks", self.vertical_chunks),
            ("chunks_x", self.chunks_x),
            ("chunks_z", self.chunks_z),
        ] {
            if value == 0 {
                return Err(TerrainError::InvalidDimension {
                    what,
                    value,
                    reason: "grid extent must be at least 1",
                });
            }
        }
        if let Some(base) = self.base_height {
            if base > self.stack_height() {
                return Err(TerrainError::InvalidDimension {
                    what: "base_height",
                    value: base,
                    reason: "must not exceed the stack height",
                });
            }
        }
        if self.threads == Some(0) {
            return Err(TerrainError::InvalidDimension {
                what: "threads",
                value: 0,
                reason: "need at least one worker",
            });
        }

        if self.octaves == 0 {
            return Err(TerrainError::InvalidDimension {
                what: "octaves",
                value: 0,
                reason: "need at least one octave",
            });
        }
        if self.octaves > 10 {
            warn!(octaves = self.octaves, "octave count above the typical 1-10 range");
        }

        check_finite("noise_scale", self.noise_scale)?;
        check_finite("height_multiplier", self.height_multiplier)?;
        check_finite("surface_level", self.surface_level)?;
        check_finite("persistence", self.persistence)?;
        check_finite("lacunarity", self.lacunarity)?;
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(TerrainError::InvalidParameter {
                name: "persistence",
                value: self.persistence as f64,
                reason: "expected 0.0-1.0",
            });
        }
        if self.persistence == 0.0 {
            warn!("persistence is 0, only the first octave contributes");
        }
        if self.lacunarity < 1.0 {
            return Err(TerrainError::InvalidParameter {
                name: "lacunarity",
                value: self.lacunarity as f64,
                reason: "expected >= 1.0",
            });
        }

        if let NoiseAlgorithm::DiamondSquare { roughness, falloff } = self.algorithm {
            let span = self.nodes_per_axis - 1;
            if !span.is_power_of_two() {
                return Err(TerrainError::InvalidDimension {
                    what: "nodes_per_axis",
                    value: self.nodes_per_axis,
                    reason: "diamond-square needs a power of two plus one",
                });
            }
            check_finite("roughness", roughness)?;
            check_finite("falloff", falloff)?;
            if roughness < 0.0 {
                return Err(TerrainError::InvalidParameter {
                    name: "roughness",
                    value: roughness as f64,
                    reason: "expected >= 0.0",
                });
            }
            if !(0.0..=1.0).contains(&falloff) {
                return Err(TerrainError::InvalidParameter {
                    name: "falloff",
                    value: falloff as f64,
                    reason: "expected 0.0-1.0",
                });
            }
        }

        self.curve.validate()?;
        if self.curve_samples < 2 {
            return Err(TerrainError::InvalidCurve(format!(
                "need at least 2 curve samples, got {}",
                self.curve_samples
            )));
        }

        Ok(())
    }
}

fn centred_range(count: usize) -> std::ops::Range<i32> {
    let count = count as i32;
    let start = -(count / 2);
    start..start + count
}

fn check_finite(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TerrainError::InvalidParameter {
            name,
            value: value as f64,
            reason: "must be finite",
        })
    }
}
