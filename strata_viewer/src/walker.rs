use glam::{Vec2, Vec3};

/// Scripted viewer that wanders across the terrain, standing on it once the
/// ground under it has loaded
pub struct Walker {
    pub position: Vec3,
    pub yaw: f32,
    pub speed: f32,
    /// Radians per second; a slow turn sweeps the view across new chunks
    pub turn_rate: f32,
    pub height: f32, // Eye height
    pub on_ground: bool,
}

impl Walker {
    pub fn new(start: Vec2) -> Self {
        Self {
            position: Vec3::new(start.x, 0.0, start.y),
            yaw: 0.0, // Face +X
            speed: 120.0,
            turn_rate: 0.15,
            height: 1.8,
            on_ground: false,
        }
    }

    pub fn update(&mut self, dt: f32, ground_height: Option<f32>) {
        self.yaw += self.turn_rate * dt;

        let forward = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        self.position += forward * self.speed * dt;

        match ground_height {
            Some(height) => {
                self.position.y = height + self.height;
                self.on_ground = true;
            }
            None => self.on_ground = false,
        }
    }

    /// Position on the XZ plane, as the streamer wants it
    pub fn viewer_position(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walks_forward() {
        let mut walker = Walker::new(Vec2::new(10.0, -5.0));
        walker.turn_rate = 0.0;
        walker.update(0.5, None);
        assert_eq!(walker.viewer_position(), Vec2::new(70.0, -5.0));
        assert!(!walker.on_ground);
    }

    #[test]
    fn test_stands_on_ground() {
        let mut walker = Walker::new(Vec2::ZERO);
        walker.update(0.1, Some(12.0));
        assert!(walker.on_ground);
        assert!((walker.position.y - 13.8).abs() < 1e-5);
    }
}
