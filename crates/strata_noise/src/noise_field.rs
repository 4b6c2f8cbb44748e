use glam::{DVec2, Vec2};
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::seed::WorldSeed;
use crate::settings::{NoiseSettings, NormalizeMode};

/// Octave offsets are drawn from [-OFFSET_RANGE, OFFSET_RANGE)
const OFFSET_RANGE: i32 = 100_000;

/// Global normalization assumes the field rarely gets past 90% of its
/// theoretical maximum
const GLOBAL_HEADROOM: f32 = 0.9;

/// Generate a `width x height` grid of fractal Perlin noise, indexed `[x][y]`.
///
/// `sample_centre` shifts the sampled window in noise space, so two chunks
/// whose centres differ by exactly their shared-edge distance sample identical
/// values along that edge.
pub fn generate_noise_map(
    width: usize,
    height: usize,
    settings: &NoiseSettings,
    sample_centre: Vec2,
) -> Vec<Vec<f32>> {
    let settings = settings.validated();
    let seed = WorldSeed::from(settings.seed);

    let mut rng = ChaCha8Rng::seed_from_u64(seed.stream(WorldSeed::OCTAVE_OFFSETS).value as u64);
    let perlin = Perlin::new(seed.stream(WorldSeed::GRADIENTS).value);

    let octave_offsets: Vec<DVec2> = (0..settings.octaves)
        .map(|_| {
            let offset_x = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE) as f64
                + settings.offset.x as f64
                + sample_centre.x as f64;
            let offset_y = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE) as f64
                - settings.offset.y as f64
                - sample_centre.y as f64;
            DVec2::new(offset_x, offset_y)
        })
        .collect();

    let max_possible_height = settings.max_possible_height();
    let scale = settings.scale as f64;
    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut max_local = f32::MIN;
    let mut min_local = f32::MAX;

    let mut map = vec![vec![0.0f32; height]; width];

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0f32;
            let mut frequency = 1.0f64;
            let mut value = 0.0f32;

            for offset in &octave_offsets {
                let sample_x = (x as f64 - half_width + offset.x) / scale * frequency;
                let sample_y = (y as f64 - half_height + offset.y) / scale * frequency;

                // Perlin output is already signed
                let perlin_value = perlin.get([sample_x, sample_y]) as f32;
                value += perlin_value * amplitude;

                amplitude *= settings.persistence;
                frequency *= settings.lacunarity as f64;
            }

            max_local = max_local.max(value);
            min_local = min_local.min(value);

            map[x][y] = match settings.normalize_mode {
                NormalizeMode::Global => {
                    let normalized = (value + 1.0) / (max_possible_height / GLOBAL_HEADROOM);
                    normalized.max(0.0)
                }
                NormalizeMode::Local => value,
            };
        }
    }

    if settings.normalize_mode == NormalizeMode::Local {
        let range = max_local - min_local;
        for column in map.iter_mut() {
            for value in column.iter_mut() {
                *value = if range > 0.0 { (*value - min_local) / range } else { 0.0 };
            }
        }
    }

    log::trace!(
        "Generated {}x{} noise map at ({}, {}), raw range [{}, {}]",
        width, height, sample_centre.x, sample_centre.y, min_local, max_local
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_settings() -> NoiseSettings {
        NoiseSettings {
            seed: 1,
            scale: 50.0,
            octaves: 6,
            persistence: 0.6,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
            normalize_mode: NormalizeMode::Global,
        }
    }

    #[test]
    fn test_deterministic_241() {
        let settings = scenario_settings();
        let a = generate_noise_map(241, 241, &settings, Vec2::ZERO);
        let b = generate_noise_map(241, 241, &settings, Vec2::ZERO);

        assert_eq!(a.len(), 241);
        assert!(a.iter().all(|column| column.len() == 241));
        for x in 0..241 {
            for y in 0..241 {
                assert_eq!(a[x][y].to_bits(), b[x][y].to_bits());
            }
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let a = generate_noise_map(32, 32, &scenario_settings(), Vec2::ZERO);
        let b = generate_noise_map(
            32,
            32,
            &NoiseSettings { seed: 2, ..scenario_settings() },
            Vec2::ZERO,
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_global_is_non_negative() {
        for seed in 0..8 {
            let settings = NoiseSettings { seed, persistence: 0.9, ..scenario_settings() };
            let map = generate_noise_map(64, 48, &settings, Vec2::new(seed as f32 * 37.0, -12.0));
            assert!(map.iter().flatten().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn test_local_spans_unit_range() {
        let settings = NoiseSettings {
            normalize_mode: NormalizeMode::Local,
            ..scenario_settings()
        };
        let map = generate_noise_map(40, 40, &settings, Vec2::ZERO);
        let min = map.iter().flatten().cloned().fold(f32::MAX, f32::min);
        let max = map.iter().flatten().cloned().fold(f32::MIN, f32::max);

        assert_eq!(min, 0.0);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(map.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_shifted_centre_lines_up() {
        // Column 20 of the first window is column 0 of a window shifted by 20
        let settings = scenario_settings();
        let a = generate_noise_map(21, 21, &settings, Vec2::ZERO);
        let b = generate_noise_map(21, 21, &settings, Vec2::new(20.0, 0.0));
        for y in 0..21 {
            assert_eq!(a[20][y].to_bits(), b[0][y].to_bits());
        }
    }

    #[test]
    fn test_non_positive_scale_is_clamped() {
        let settings = NoiseSettings { scale: 0.0, ..scenario_settings() };
        let map = generate_noise_map(8, 8, &settings, Vec2::ZERO);
        assert!(map.iter().flatten().all(|v| v.is_finite()));
    }
}
