//! Response curves used to reshape noise heights.
//!
//! A [`ResponseCurve`] is an ordered set of keyframes evaluated with cubic
//! Hermite segments. Generation never evaluates it directly: it is baked once
//! into a [`SampledCurve`], a fixed lookup table that worker threads share
//! read-only and that only ever interpolates between two stored samples.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Sample resolution used when nothing else is configured.
pub const DEFAULT_CURVE_SAMPLES: usize = 10_000;

/// One control point of a response curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key (used by the segment ending here)
    #[serde(default)]
    pub in_tangent: f32,
    /// Slope leaving this key (used by the segment starting here)
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Key with flat tangents.
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value, in_tangent: 0.0, out_tangent: 0.0 }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self { time, value, in_tangent, out_tangent }
    }
}

/// Keyframed curve, clamped to its first/last value outside the key range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCurve {
    keys: Vec<Keyframe>,
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl ResponseCurve {
    pub fn new(keys: Vec<Keyframe>) -> Result<Self> {
        let curve = Self { keys };
        curve.validate()?;
        Ok(curve)
    }

    /// Straight line from (0, 0) to (1, 1).
    pub fn linear() -> Self {
        Self {
            keys: vec![
                Keyframe::with_tangents(0.0, 0.0, 1.0, 1.0),
                Keyframe::with_tangents(1.0, 1.0, 1.0, 1.0),
            ],
        }
    }

    /// Keys must be finite and strictly increasing in time.
    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(TerrainError::InvalidCurve("curve has no keyframes".into()));
        }
        for (i, key) in self.keys.iter().enumerate() {
            let finite = key.time.is_finite()
                && key.value.is_finite()
                && key.in_tangent.is_finite()
                && key.out_tangent.is_finite();
            if !finite {
                return Err(TerrainError::InvalidCurve(format!(
                    "keyframe {} has a non-finite component",
                    i
                )));
            }
        }
        for (i, pair) in self.keys.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(TerrainError::InvalidCurve(format!(
                    "keyframe {} (t={}) does not come after keyframe {} (t={})",
                    i + 1,
                    pair[1].time,
                    i,
                    pair[0].time
                )));
            }
        }
        Ok(())
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn start_time(&self) -> f32 {
        self.keys.first().map_or(0.0, |k| k.time)
    }

    pub fn end_time(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Evaluate the curve at `time`.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; the segment starts one before it.
        let next = self.keys.partition_point(|k| k.time <= time);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];
        hermite(k0, k1, time)
    }
}

fn hermite(k0: &Keyframe, k1: &Keyframe, time: f32) -> f32 {
    let dt = k1.time - k0.time;
    let s = (time - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
}

/// Precomputed lookup table over a [`ResponseCurve`].
///
/// Samples are taken at evenly spaced times between the first and last key;
/// [`SampledCurve::evaluate`] maps `[0, 1]` onto that table.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledCurve {
    samples: Vec<f32>,
}

impl SampledCurve {
    pub fn build(curve: &ResponseCurve, sample_count: usize) -> Result<Self> {
        curve.validate()?;
        if sample_count < 2 {
            return Err(TerrainError::InvalidCurve(format!(
                "need at least 2 samples, got {}",
                sample_count
            )));
        }

        let from = curve.start_time();
        let to = curve.end_time();
        let last = sample_count - 1;
        let step = (to - from) / last as f32;

        let samples = (0..sample_count)
            .map(|i| {
                // Hit the last key exactly instead of accumulating step error
                let time = if i == last { to } else { from + i as f32 * step };
                curve.evaluate(time)
            })
            .collect();

        Ok(Self { samples })
    }

    /// Interpolated lookup. `t` is clamped to `[0, 1]`; NaN reads as 0.
    pub fn evaluate(&self, t: f32) -> f32 {
        let len = self.samples.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let float_index = t * len as f32;
        let floor = (float_index.floor() as usize).min(len);
        if floor == len {
            return self.samples[len];
        }

        let lower = self.samples[floor];
        let higher = self.samples[floor + 1];
        let fraction = float_index - floor as f32;
        lower + (higher - lower) * fraction
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute difference between two neighbouring samples.
    pub fn max_step(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hill() -> ResponseCurve {
        ResponseCurve::new(vec![
            Keyframe::new(0.0, 0.2),
            Keyframe::with_tangents(0.5, 1.0, 0.0, 0.0),
            Keyframe::new(1.0, 0.4),
        ])
        .unwrap()
    }

    #[test]
    fn test_linear_curve_is_identity() {
        let curve = ResponseCurve::linear();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-5, "t={}", t);
        }
    }

    #[test]
    fn test_curve_clamps_outside_keys() {
        let curve = hill();
        assert_eq!(curve.evaluate(-3.0), 0.2);
        assert_eq!(curve.evaluate(7.0), 0.4);
    }

    #[test]
    fn test_curve_passes_through_keys() {
        let curve = hill();
        assert!((curve.evaluate(0.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_unordered_keys() {
        let result = ResponseCurve::new(vec![Keyframe::new(0.5, 0.0), Keyframe::new(0.2, 1.0)]);
        assert!(matches!(result, Err(TerrainError::InvalidCurve(_))));
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(ResponseCurve::new(Vec::new()).is_err());
        assert!(ResponseCurve::new(vec![Keyframe::new(0.0, f32::NAN)]).is_err());
    }

    #[test]
    fn test_sampled_endpoints_match_keys() {
        let curve = hill();
        let sampled = SampledCurve::build(&curve, DEFAULT_CURVE_SAMPLES).unwrap();
        assert_eq!(sampled.len(), DEFAULT_CURVE_SAMPLES);
        assert_eq!(sampled.evaluate(0.0), 0.2);
        assert_eq!(sampled.evaluate(1.0), 0.4);
    }

    #[test]
    fn test_sampled_clamps_input() {
        let sampled = SampledCurve::build(&hill(), 64).unwrap();
        assert_eq!(sampled.evaluate(-1.0), sampled.evaluate(0.0));
        assert_eq!(sampled.evaluate(2.0), sampled.evaluate(1.0));
        assert_eq!(sampled.evaluate(f32::NAN), sampled.evaluate(0.0));
    }

    #[test]
    fn test_sampled_is_continuous() {
        let sampled = SampledCurve::build(&hill(), 100).unwrap();
        let max_step = sampled.max_step();
        let steps = 5000;
        let mut previous = sampled.evaluate(0.0);
        for i in 1..=steps {
            let value = sampled.evaluate(i as f32 / steps as f32);
            assert!((value - previous).abs() <= max_step + 1e-6);
            previous = value;
        }
    }

    #[test]
    fn test_sampled_interpolates_between_neighbours() {
        let curve = ResponseCurve::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)]).unwrap();
        let sampled = SampledCurve::build(&curve, 3).unwrap();
        // samples: 0.0, 0.5, 1.0 (flat tangents make the midpoint exact)
        assert!((sampled.samples()[1] - 0.5).abs() < 1e-6);
        assert!((sampled.evaluate(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_single_key_is_constant() {
        let curve = ResponseCurve::new(vec![Keyframe::new(0.3, 0.7)]).unwrap();
        let sampled = SampledCurve::build(&curve, 16).unwrap();
        assert!(sampled.samples().iter().all(|&s| s == 0.7));
        assert_eq!(sampled.max_step(), 0.0);
    }

    #[test]
    fn test_rejects_too_few_samples() {
        assert!(SampledCurve::build(&ResponseCurve::linear(), 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_evaluate_stays_within_samples(t in -2.0f32..3.0) {
            let sampled = SampledCurve::build(&hill(), 257).unwrap();
            let min = sampled.samples().iter().cloned().fold(f32::MAX, f32::min);
            let max = sampled.samples().iter().cloned().fold(f32::MIN, f32::max);
            let value = sampled.evaluate(t);
            prop_assert!(value >= min - 1e-6 && value <= max + 1e-6);
        }
    }
}
