use glam::Vec2;

use crate::falloff::generate_falloff_map;
use crate::noise_field::generate_noise_map;
use crate::settings::HeightMapSettings;

/// World-space heights for one chunk, indexed `[x][y]`
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    pub values: Vec<Vec<f32>>,
    pub min_value: f32,
    pub max_value: f32,
}

impl HeightMap {
    /// Wrap an existing grid, computing its min/max
    pub fn from_values(values: Vec<Vec<f32>>) -> Self {
        let (min_value, max_value) = values
            .iter()
            .flatten()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        Self { values, min_value, max_value }
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn height(&self) -> usize {
        self.values.first().map_or(0, |column| column.len())
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[x][y]
    }
}

/// Sample noise around `sample_centre` and push it through the height curve.
///
/// Runs on worker threads; the settings (and the curve inside them) are only
/// read, never mutated.
pub fn generate_height_map(
    width: usize,
    height: usize,
    settings: &HeightMapSettings,
    sample_centre: Vec2,
) -> HeightMap {
    let settings = settings.validated();
    let mut values = generate_noise_map(width, height, &settings.noise, sample_centre);

    let falloff = settings
        .use_falloff
        .then(|| generate_falloff_map(width.max(height)));

    let mut min_value = f32::MAX;
    let mut max_value = f32::MIN;

    for (x, column) in values.iter_mut().enumerate() {
        for (y, value) in column.iter_mut().enumerate() {
            let mut noise_value = *value;
            if let Some(falloff) = &falloff {
                noise_value = (noise_value - falloff[x][y]).clamp(0.0, 1.0);
            }

            *value = settings.height_curve.evaluate(noise_value) * settings.height_multiplier;

            max_value = max_value.max(*value);
            min_value = min_value.min(*value);
        }
    }

    HeightMap { values, min_value, max_value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::HeightCurve;
    use crate::settings::{NoiseSettings, NormalizeMode};

    #[test]
    fn test_min_max_bound_every_cell() {
        let settings = HeightMapSettings {
            height_multiplier: 42.0,
            height_curve: HeightCurve::smooth_from_points(&[(0.0, 0.0), (0.4, 0.05), (1.0, 1.0)]),
            ..Default::default()
        };
        for seed in 0..4 {
            let settings = HeightMapSettings {
                noise: NoiseSettings { seed, ..settings.noise.clone() },
                ..settings.clone()
            };
            let map = generate_height_map(29, 29, &settings, Vec2::new(seed as f32 * 100.0, 0.0));

            assert_eq!(map.width(), 29);
            assert_eq!(map.height(), 29);
            assert!(map.min_value <= map.max_value);
            for v in map.values.iter().flatten() {
                assert!(map.min_value <= *v && *v <= map.max_value);
            }
        }
    }

    #[test]
    fn test_min_max_tracks_transformed_values() {
        // A constant curve collapses every cell to the same height
        let settings = HeightMapSettings {
            height_multiplier: 10.0,
            height_curve: HeightCurve::from_points(&[(0.0, 0.5), (1.0, 0.5)]),
            ..Default::default()
        };
        let map = generate_height_map(16, 16, &settings, Vec2::ZERO);
        assert!((map.min_value - 5.0).abs() < 1e-4);
        assert!((map.max_value - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_falloff_flattens_border() {
        let settings = HeightMapSettings {
            use_falloff: true,
            noise: NoiseSettings {
                normalize_mode: NormalizeMode::Local,
                ..Default::default()
            },
            ..Default::default()
        };
        let map = generate_height_map(25, 25, &settings, Vec2::ZERO);
        for i in 0..25 {
            assert_eq!(map.get(0, i), 0.0);
            assert_eq!(map.get(i, 24), 0.0);
        }
    }

    #[test]
    fn test_from_values() {
        let map = HeightMap::from_values(vec![vec![1.0, -2.0], vec![3.5, 0.0]]);
        assert_eq!(map.min_value, -2.0);
        assert_eq!(map.max_value, 3.5);
        assert_eq!(map.get(1, 0), 3.5);
    }
}
