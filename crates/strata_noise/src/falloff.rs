/// Steepness of the falloff ramp
const FALLOFF_A: f32 = 3.0;
/// Where the ramp sits between centre and border
const FALLOFF_B: f32 = 2.2;

/// Square `size x size` falloff mask, indexed `[x][y]`.
/// 0 in the middle rising towards 1 at the border; subtracting it from a
/// noise map turns a single chunk into an island.
pub fn generate_falloff_map(size: usize) -> Vec<Vec<f32>> {
    let mut map = vec![vec![0.0f32; size]; size];
    if size == 0 {
        return map;
    }

    let denom = (size.max(2) - 1) as f32;
    for (i, column) in map.iter_mut().enumerate() {
        for (j, value) in column.iter_mut().enumerate() {
            let x = i as f32 / denom * 2.0 - 1.0;
            let y = j as f32 / denom * 2.0 - 1.0;
            *value = evaluate(x.abs().max(y.abs()));
        }
    }
    map
}

fn evaluate(t: f32) -> f32 {
    let ta = t.powf(FALLOFF_A);
    ta / (ta + (FALLOFF_B - FALLOFF_B * t).powf(FALLOFF_A))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_low_border_high() {
        let map = generate_falloff_map(33);
        assert!(map[16][16] < 1e-6);
        assert!((map[0][16] - 1.0).abs() < 1e-6);
        assert!((map[32][32] - 1.0).abs() < 1e-6);
        assert!(map[8][16] < map[4][16]);
    }

    #[test]
    fn test_symmetric() {
        let map = generate_falloff_map(20);
        for i in 0..20 {
            for j in 0..20 {
                assert!((map[i][j] - map[19 - i][j]).abs() < 1e-5);
                assert_eq!(map[i][j], map[j][i]);
            }
        }
    }
}
