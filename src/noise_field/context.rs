//! Explicit noise state threaded through every height-plane generator.
//!
//! Nothing here is global: each column builds its own [`NoiseContext`] from
//! the shared [`NoiseSettings`], so columns can be generated concurrently.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::TerrainConfig;

/// Substitute for a non-positive noise scale.
pub const MIN_NOISE_SCALE: f64 = 1e-4;

/// Range of the random per-octave offsets.
pub const OCTAVE_OFFSET_RANGE: f64 = 100_000.0;

/// Noise parameters shared by every column of a build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSettings {
    pub seed: u32,
    pub noise_scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
}

impl NoiseSettings {
    pub fn from_config(config: &TerrainConfig) -> Self {
        Self {
            seed: config.seed,
            noise_scale: config.noise_scale,
            octaves: config.octaves,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
        }
    }
}

/// Sample-space shift applied to one octave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctaveOffset {
    pub x: f64,
    pub y: f64,
}

/// Per-octave `(amplitude, frequency)` pairs.
///
/// Starts at `(1, 1)`; after each octave amplitude is multiplied by
/// persistence and frequency by lacunarity.
#[derive(Clone, Debug)]
pub struct OctaveSchedule {
    amplitude: f64,
    frequency: f64,
    persistence: f64,
    lacunarity: f64,
    remaining: u32,
}

impl OctaveSchedule {
    pub fn new(octaves: u32, persistence: f32, lacunarity: f32) -> Self {
        Self {
            amplitude: 1.0,
            frequency: 1.0,
            persistence: persistence as f64,
            lacunarity: lacunarity as f64,
            remaining: octaves,
        }
    }
}

impl Iterator for OctaveSchedule {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = (self.amplitude, self.frequency);
        self.amplitude *= self.persistence;
        self.frequency *= self.lacunarity;
        Some(current)
    }
}

/// Octave offsets plus the smooth-noise primitive for one column.
pub struct NoiseContext {
    perlin: Perlin,
    offsets: Vec<OctaveOffset>,
    noise_scale: f64,
    persistence: f32,
    lacunarity: f32,
}

impl NoiseContext {
    /// Seed a generator once and draw one offset pair per octave.
    ///
    /// `manual_offset` is the column's world `(x, z)` origin; it is added to
    /// every drawn pair so neighbouring columns sample one continuous field.
    pub fn new(settings: &NoiseSettings, manual_offset: [f64; 2]) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed as u64);
        let offsets = (0..settings.octaves)
            .map(|_| {
                let x = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) + manual_offset[0];
                let y = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE) + manual_offset[1];
                OctaveOffset { x, y }
            })
            .collect();

        let mut noise_scale = settings.noise_scale as f64;
        if !(noise_scale > 0.0) {
            debug!(noise_scale, "non-positive noise scale, clamping to {}", MIN_NOISE_SCALE);
            noise_scale = MIN_NOISE_SCALE;
        }

        Self {
            perlin: Perlin::new(settings.seed),
            offsets,
            noise_scale,
            persistence: settings.persistence,
            lacunarity: settings.lacunarity,
        }
    }

    pub fn offsets(&self) -> &[OctaveOffset] {
        &self.offsets
    }

    /// Effective scale after clamping.
    pub fn noise_scale(&self) -> f64 {
        self.noise_scale
    }

    pub fn schedule(&self) -> OctaveSchedule {
        OctaveSchedule::new(self.offsets.len() as u32, self.persistence, self.lacunarity)
    }

    /// Smooth noise remapped from its unit range to `[-1, 1]`.
    #[inline]
    pub fn smooth_noise(&self, x: f64, y: f64) -> f64 {
        let unit = (self.perlin.get([x, y]) * 0.5 + 0.5).clamp(0.0, 1.0);
        (unit - 0.5) * 2.0
    }

    /// Octave sum at local grid position `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f32 {
        let mut height = 0.0;
        for (offset, (amplitude, frequency)) in self.offsets.iter().zip(self.schedule()) {
            let sample_x = (x + offset.x) / self.noise_scale * frequency;
            let sample_y = (y + offset.y) / self.noise_scale * frequency;
            height += self.smooth_noise(sample_x, sample_y) * amplitude;
        }
        height as f32
    }
}
