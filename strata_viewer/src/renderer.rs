use std::collections::HashMap;

use glam::Vec2;
use strata_mesh::{MeshData, TerrainVertex, NUM_SUPPORTED_LODS};
use strata_stream::{ChunkCoord, ChunkEvent, TextureSettings};

/// What the streamer needs from whatever draws the terrain
pub trait TerrainRenderer {
    /// A new chunk object at `world_position` (x, z); hidden until told otherwise
    fn place_chunk(&mut self, _coord: ChunkCoord, _world_position: Vec2) {}
    fn create_mesh(&mut self, coord: ChunkCoord, lod: u32, mesh: &MeshData);
    fn apply_texture(&mut self, texture: &TextureSettings, min_height: f32, max_height: f32);
    fn set_visible(&mut self, coord: ChunkCoord, visible: bool);
    fn set_collider(&mut self, coord: ChunkCoord, mesh: &MeshData);
}

/// Forward one tick's worth of streamer output to the renderer
pub fn apply_events<R: TerrainRenderer + ?Sized>(renderer: &mut R, events: &[ChunkEvent]) {
    for event in events {
        match event {
            ChunkEvent::ChunkCreated { coord, world_position } => renderer.place_chunk(*coord, *world_position),
            ChunkEvent::VisibilityChanged { coord, visible } => renderer.set_visible(*coord, *visible),
            ChunkEvent::MeshAssigned { coord, lod, mesh, .. } => renderer.create_mesh(*coord, *lod, mesh),
            ChunkEvent::ColliderAssigned { coord, mesh } => renderer.set_collider(*coord, mesh),
        }
    }
}

/// Per-chunk state a GPU backend would hold
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffers {
    pub world_position: Vec2,
    pub lod: Option<u32>,
    pub vertex_bytes: usize,
    pub index_bytes: usize,
    pub visible: bool,
    pub collider_triangles: Option<usize>,
}

/// Headless renderer: builds the upload buffers and keeps their sizes
#[derive(Debug, Default)]
pub struct BufferRenderer {
    pub chunks: HashMap<ChunkCoord, ChunkBuffers>,
    pub texture_layers: usize,
    pub height_range: (f32, f32),
    pub uploads: usize,
}

impl BufferRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_count(&self) -> usize {
        self.chunks.values().filter(|c| c.visible).count()
    }

    /// Bytes resident for visible chunks
    pub fn visible_bytes(&self) -> usize {
        self.chunks
            .values()
            .filter(|c| c.visible)
            .map(|c| c.vertex_bytes + c.index_bytes)
            .sum()
    }

    pub fn collider_count(&self) -> usize {
        self.chunks.values().filter(|c| c.collider_triangles.is_some()).count()
    }

    /// Visible chunks per LOD
    pub fn lod_histogram(&self) -> [usize; NUM_SUPPORTED_LODS] {
        let mut histogram = [0; NUM_SUPPORTED_LODS];
        for lod in self.chunks.values().filter(|c| c.visible).filter_map(|c| c.lod) {
            histogram[lod as usize] += 1;
        }
        histogram
    }
}

impl TerrainRenderer for BufferRenderer {
    fn place_chunk(&mut self, coord: ChunkCoord, world_position: Vec2) {
        self.chunks.entry(coord).or_default().world_position = world_position;
    }

    fn create_mesh(&mut self, coord: ChunkCoord, lod: u32, mesh: &MeshData) {
        let vertices = mesh.to_vertices();
        let vertex_bytes = bytemuck::cast_slice::<TerrainVertex, u8>(&vertices).len();
        let index_bytes = bytemuck::cast_slice::<u32, u8>(mesh.triangles()).len();

        let chunk = self.chunks.entry(coord).or_default();
        chunk.lod = Some(lod);
        chunk.vertex_bytes = vertex_bytes;
        chunk.index_bytes = index_bytes;
        self.uploads += 1;

        log::debug!(
            "Uploaded chunk ({}, {}) LOD {}: {} vertices, {} triangles, {} bytes",
            coord.x,
            coord.z,
            lod,
            vertices.len(),
            mesh.triangle_count(),
            vertex_bytes + index_bytes
        );
    }

    fn apply_texture(&mut self, texture: &TextureSettings, min_height: f32, max_height: f32) {
        self.texture_layers = texture.layers.len();
        self.height_range = (min_height, max_height);
        log::info!(
            "Terrain material: {} layers over heights {:.1}..{:.1}",
            texture.layers.len(),
            min_height,
            max_height
        );
    }

    fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
        let chunk = self.chunks.entry(coord).or_default();
        chunk.visible = visible;
        log::trace!(
            "Chunk ({}, {}) at {:?} {}",
            coord.x,
            coord.z,
            chunk.world_position,
            if visible { "shown" } else { "hidden" }
        );
    }

    fn set_collider(&mut self, coord: ChunkCoord, mesh: &MeshData) {
        self.chunks.entry(coord).or_default().collider_triangles = Some(mesh.triangle_count());
        log::debug!("Collider for chunk ({}, {}): {} triangles", coord.x, coord.z, mesh.triangle_count());
    }
}
