pub mod curve;
pub mod falloff;
pub mod height_map;
pub mod noise_field;
pub mod seed;
pub mod settings;

// Re-export commonly used items
pub use curve::{HeightCurve, Keyframe};
pub use falloff::generate_falloff_map;
pub use height_map::{generate_height_map, HeightMap};
pub use noise_field::generate_noise_map;
pub use seed::WorldSeed;
pub use settings::{HeightMapSettings, NoiseSettings, NormalizeMode};
