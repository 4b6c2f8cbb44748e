use serde::{Deserialize, Serialize};

/// A single control point of a [`HeightCurve`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self { time, value, in_tangent, out_tangent }
    }
}

/// Response curve mapping normalized noise to a height factor.
///
/// Segments are cubic Hermite splines between consecutive keys; input outside
/// the key range is clamped to the first/last key. The curve is immutable, so
/// a clone can be handed to any worker thread and evaluated there without
/// coordination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct HeightCurve {
    keys: Vec<Keyframe>,
}

impl HeightCurve {
    /// Build a curve from explicit keys. Keys are sorted by time.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        if keys.is_empty() {
            return Self::linear();
        }
        Self { keys }
    }

    /// Identity on [0, 1]
    pub fn linear() -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, 0.0, 1.0, 1.0), Keyframe::new(1.0, 1.0, 1.0, 1.0)],
        }
    }

    /// Piecewise linear curve through the given `(time, value)` points
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let slope = |a: (f32, f32), b: (f32, f32)| {
            let dt = b.0 - a.0;
            if dt.abs() > f32::EPSILON { (b.1 - a.1) / dt } else { 0.0 }
        };

        let keys = (0..sorted.len())
            .map(|i| {
                let (time, value) = sorted[i];
                let in_tangent = if i > 0 { slope(sorted[i - 1], sorted[i]) } else { 0.0 };
                let out_tangent = if i + 1 < sorted.len() { slope(sorted[i], sorted[i + 1]) } else { 0.0 };
                Keyframe::new(time, value, in_tangent, out_tangent)
            })
            .collect();

        Self::new(keys)
    }

    /// Smooth curve through the given points with Catmull-Rom style tangents
    pub fn smooth_from_points(points: &[(f32, f32)]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        let n = sorted.len();

        let keys = (0..n)
            .map(|i| {
                let prev = sorted[i.saturating_sub(1)];
                let next = sorted[(i + 1).min(n - 1)];
                let dt = next.0 - prev.0;
                let tangent = if dt.abs() > f32::EPSILON { (next.1 - prev.1) / dt } else { 0.0 };
                Keyframe::new(sorted[i].0, sorted[i].1, tangent, tangent)
            })
            .collect();

        Self::new(keys)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Sample the curve at `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let first = self.keys[0];
        let last = self.keys[self.keys.len() - 1];

        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; keys are sorted so the segment is [idx - 1, idx]
        let idx = self.keys.partition_point(|k| k.time <= t);
        let k0 = self.keys[idx - 1];
        let k1 = self.keys[idx];

        let dt = k1.time - k0.time;
        if dt <= f32::EPSILON {
            return k1.value;
        }

        let s = (t - k0.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl From<Vec<Keyframe>> for HeightCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<HeightCurve> for Vec<Keyframe> {
    fn from(curve: HeightCurve) -> Self {
        curve.keys
    }
}
