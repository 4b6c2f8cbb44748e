use serde::{Deserialize, Serialize};
use strata_noise::settings::MIN_POSITIVE;

/// One height band of the terrain material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureLayer {
    pub name: String,
    pub tint: [f32; 3],
    pub tint_strength: f32,
    /// Fraction of the height range where this layer starts
    pub start_height: f32,
    pub blend_strength: f32,
    pub texture_scale: f32,
}

impl Default for TextureLayer {
    fn default() -> Self {
        Self {
            name: String::new(),
            tint: [1.0, 1.0, 1.0],
            tint_strength: 1.0,
            start_height: 0.0,
            blend_strength: 0.0,
            texture_scale: 1.0,
        }
    }
}

impl TextureLayer {
    pub fn new(name: &str, tint: [f32; 3], start_height: f32, blend_strength: f32) -> Self {
        Self {
            name: name.to_string(),
            tint,
            start_height,
            blend_strength,
            ..Default::default()
        }
    }
}

/// Height-banded layers handed to the renderer's terrain material.
/// Layers are applied in order, each painting over the ones before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub layers: Vec<TextureLayer>,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            layers: vec![
                TextureLayer::new("water", [0.16, 0.32, 0.62], 0.0, 0.0),
                TextureLayer::new("sand", [0.82, 0.78, 0.52], 0.12, 0.05),
                TextureLayer::new("grass", [0.30, 0.55, 0.20], 0.22, 0.10),
                TextureLayer::new("rock", [0.42, 0.38, 0.34], 0.55, 0.12),
                TextureLayer::new("snow", [0.95, 0.95, 0.97], 0.80, 0.10),
            ],
        }
    }
}

fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

impl TextureSettings {
    pub fn validated(&self) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|layer| TextureLayer {
                tint: layer.tint.map(|c| c.clamp(0.0, 1.0)),
                tint_strength: layer.tint_strength.clamp(0.0, 1.0),
                start_height: layer.start_height.clamp(0.0, 1.0),
                blend_strength: layer.blend_strength.clamp(0.0, 1.0),
                texture_scale: layer.texture_scale.max(MIN_POSITIVE),
                ..layer.clone()
            })
            .collect();
        Self { layers }
    }

    /// Untextured colour at `height_percent` of the height range, blending
    /// layers the way the terrain shader does
    pub fn sample_colour(&self, height_percent: f32) -> [f32; 3] {
        const EPSILON: f32 = 1e-4;
        let mut colour = [0.0f32; 3];

        for layer in &self.layers {
            let half_blend = layer.blend_strength / 2.0;
            let draw_strength =
                inverse_lerp(-half_blend - EPSILON, half_blend, height_percent - layer.start_height);
            for (c, tint) in colour.iter_mut().zip(layer.tint) {
                *c = *c * (1.0 - draw_strength) + tint * layer.tint_strength * draw_strength;
            }
        }
        colour
    }

    /// [`sample_colour`](Self::sample_colour) for a world-space height
    pub fn colour_at_height(&self, height: f32, min_height: f32, max_height: f32) -> [f32; 3] {
        self.sample_colour(inverse_lerp(min_height, max_height, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_hard_bands() {
        let settings = TextureSettings {
            layers: vec![
                TextureLayer::new("low", [1.0, 0.0, 0.0], 0.0, 0.0),
                TextureLayer::new("high", [0.0, 0.0, 1.0], 0.5, 0.0),
            ],
        };
        assert!(approx(settings.sample_colour(0.2), [1.0, 0.0, 0.0]));
        assert!(approx(settings.sample_colour(0.5), [0.0, 0.0, 1.0]));
        assert!(approx(settings.sample_colour(0.9), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_blend_mixes_neighbours() {
        let settings = TextureSettings {
            layers: vec![
                TextureLayer::new("low", [1.0, 0.0, 0.0], 0.0, 0.0),
                TextureLayer::new("high", [0.0, 0.0, 1.0], 0.5, 0.4),
            ],
        };
        let mid = settings.sample_colour(0.5);
        assert!(mid[0] > 0.3 && mid[0] < 0.7);
        assert!(mid[2] > 0.3 && mid[2] < 0.7);
    }

    #[test]
    fn test_world_height_maps_to_range() {
        let settings = TextureSettings::default();
        assert_eq!(settings.colour_at_height(-10.0, 0.0, 30.0), settings.sample_colour(0.0));
        assert_eq!(settings.colour_at_height(99.0, 0.0, 30.0), settings.sample_colour(1.0));
    }

    #[test]
    fn test_validated_clamps() {
        let settings = TextureSettings {
            layers: vec![TextureLayer {
                tint_strength: 3.0,
                start_height: -1.0,
                texture_scale: 0.0,
                ..Default::default()
            }],
        }
        .validated();
        let layer = &settings.layers[0];
        assert_eq!(layer.tint_strength, 1.0);
        assert_eq!(layer.start_height, 0.0);
        assert_eq!(layer.texture_scale, MIN_POSITIVE);
    }
}
