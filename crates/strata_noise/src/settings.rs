use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::curve::HeightCurve;

/// Smallest value a scale or multiplier is allowed to take after validation
pub const MIN_POSITIVE: f32 = 0.01;

/// How raw octave sums are mapped back into a usable range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeMode {
    /// Rescale by this sample's own min/max. Neighbouring chunks will not line up.
    Local,
    /// Rescale by the theoretical maximum amplitude. Safe for chunk streaming.
    Global,
}

/// Parameters for a multi-octave noise field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub seed: i32,
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
    pub normalize_mode: NormalizeMode,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Global,
        }
    }
}

impl NoiseSettings {
    /// Clamp every field into its legal range. Never fails.
    pub fn validated(&self) -> Self {
        Self {
            seed: self.seed,
            scale: self.scale.max(MIN_POSITIVE),
            octaves: self.octaves.max(1),
            persistence: self.persistence.clamp(0.0, 1.0),
            lacunarity: self.lacunarity.max(1.0),
            offset: self.offset,
            normalize_mode: self.normalize_mode,
        }
    }

    /// Sum of all octave amplitudes, the largest magnitude the raw field can reach
    pub fn max_possible_height(&self) -> f32 {
        let mut amplitude = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves.max(1) {
            total += amplitude;
            amplitude *= self.persistence;
        }
        total
    }
}

/// Noise settings plus the response curve that turns noise into world heights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    pub noise: NoiseSettings,
    pub use_falloff: bool,
    pub height_multiplier: f32,
    pub height_curve: HeightCurve,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            use_falloff: false,
            height_multiplier: 30.0,
            height_curve: HeightCurve::linear(),
        }
    }
}

impl HeightMapSettings {
    pub fn validated(&self) -> Self {
        Self {
            noise: self.noise.validated(),
            use_falloff: self.use_falloff,
            height_multiplier: self.height_multiplier.max(MIN_POSITIVE),
            height_curve: self.height_curve.clone(),
        }
    }

    /// Height produced by a noise value of 0
    pub fn min_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(0.0)
    }

    /// Height produced by a noise value of 1
    pub fn max_height(&self) -> f32 {
        self.height_multiplier * self.height_curve.evaluate(1.0)
    }
}
