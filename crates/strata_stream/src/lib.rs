pub mod chunk;
pub mod config;
pub mod lod;
pub mod streamer;
pub mod texture;
pub mod work_queue;

// Re-export commonly used items
pub use chunk::{Bounds2, ChunkCoord, ChunkState, MeshState, TerrainChunk};
pub use config::{ConfigError, TerrainConfig};
pub use lod::{select_lod_index, validate_detail_levels, LodInfo};
pub use streamer::{ChunkEvent, StreamerStats, TerrainStreamer};
pub use texture::{TextureLayer, TextureSettings};
pub use work_queue::WorkQueue;
