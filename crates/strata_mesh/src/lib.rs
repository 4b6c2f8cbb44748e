pub mod mesh_data;
pub mod settings;
pub mod triangulator;

pub use mesh_data::{EdgeConnectionVertex, MeshData, TerrainVertex, VertexRef};
pub use settings::{
    MeshSettings, NUM_SUPPORTED_LODS, SUPPORTED_CHUNK_SIZES, SUPPORTED_FLATSHADED_CHUNK_SIZES,
};
pub use triangulator::{generate_terrain_mesh, skip_increment};
