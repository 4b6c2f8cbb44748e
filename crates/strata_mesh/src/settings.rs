use serde::{Deserialize, Serialize};
use strata_noise::settings::MIN_POSITIVE;

/// Number of distinct LOD levels a mesh can be built at (0..=4)
pub const NUM_SUPPORTED_LODS: usize = 5;

/// Chunk edge lengths (in quads) that every supported skip increment divides
pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];

/// Flat shading triples the vertex count, so only the small sizes are offered
pub const SUPPORTED_FLATSHADED_CHUNK_SIZES: [usize; 3] = [48, 72, 96];

/// Vertices added around the visible chunk: one out-of-mesh ring, one mesh-edge
/// ring and the shared edge-connection column
const BORDER_VERTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    pub mesh_scale: f32,
    pub use_flat_shading: bool,
    pub chunk_size_index: usize,
    pub flatshaded_chunk_size_index: usize,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_scale: 2.5,
            use_flat_shading: false,
            chunk_size_index: SUPPORTED_CHUNK_SIZES.len() - 1,
            flatshaded_chunk_size_index: SUPPORTED_FLATSHADED_CHUNK_SIZES.len() - 1,
        }
    }
}

impl MeshSettings {
    /// Clamp scale and table indices into range
    pub fn validated(&self) -> Self {
        Self {
            mesh_scale: self.mesh_scale.max(MIN_POSITIVE),
            use_flat_shading: self.use_flat_shading,
            chunk_size_index: self.chunk_size_index.min(SUPPORTED_CHUNK_SIZES.len() - 1),
            flatshaded_chunk_size_index: self
                .flatshaded_chunk_size_index
                .min(SUPPORTED_FLATSHADED_CHUNK_SIZES.len() - 1),
        }
    }

    /// Visible chunk size in quads at LOD 0
    pub fn chunk_size(&self) -> usize {
        if self.use_flat_shading {
            SUPPORTED_FLATSHADED_CHUNK_SIZES[self.flatshaded_chunk_size_index.min(SUPPORTED_FLATSHADED_CHUNK_SIZES.len() - 1)]
        } else {
            SUPPORTED_CHUNK_SIZES[self.chunk_size_index.min(SUPPORTED_CHUNK_SIZES.len() - 1)]
        }
    }

    /// Vertices along one edge of the height map, border included
    pub fn num_verts_per_line(&self) -> usize {
        self.chunk_size() + BORDER_VERTS
    }

    /// World-space edge length of the rendered part of a chunk
    pub fn mesh_world_size(&self) -> f32 {
        (self.num_verts_per_line() - 3) as f32 * self.mesh_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_sizes() {
        let settings = MeshSettings {
            mesh_scale: 2.0,
            chunk_size_index: 0,
            ..Default::default()
        };
        assert_eq!(settings.num_verts_per_line(), 53);
        assert_eq!(settings.mesh_world_size(), 100.0);
    }

    #[test]
    fn test_flat_shading_uses_its_own_table() {
        let settings = MeshSettings {
            use_flat_shading: true,
            chunk_size_index: 8,
            flatshaded_chunk_size_index: 1,
            ..Default::default()
        };
        assert_eq!(settings.chunk_size(), 72);
    }

    #[test]
    fn test_validation() {
        let settings = MeshSettings {
            mesh_scale: -1.0,
            chunk_size_index: 99,
            flatshaded_chunk_size_index: 99,
            ..Default::default()
        }
        .validated();
        assert_eq!(settings.mesh_scale, MIN_POSITIVE);
        assert_eq!(settings.chunk_size_index, 8);
        assert_eq!(settings.flatshaded_chunk_size_index, 2);
    }

    #[test]
    fn test_every_lod_divides_every_size() {
        for size in SUPPORTED_CHUNK_SIZES {
            for lod in 0..NUM_SUPPORTED_LODS {
                let skip = if lod == 0 { 1 } else { lod * 2 };
                assert_eq!(size % skip, 0);
            }
        }
    }
}
