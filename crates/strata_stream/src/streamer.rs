use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec2;
use strata_mesh::MeshData;
use strata_noise::HeightMap;

use crate::chunk::{ChunkContext, ChunkCoord, MeshState, TerrainChunk};
use crate::config::TerrainConfig;
use crate::lod::validate_detail_levels;
use crate::work_queue::WorkQueue;

const VIEWER_MOVE_THRESHOLD_FOR_CHUNK_UPDATE: f32 = 25.0;
const SQR_VIEWER_MOVE_THRESHOLD_FOR_CHUNK_UPDATE: f32 =
    VIEWER_MOVE_THRESHOLD_FOR_CHUNK_UPDATE * VIEWER_MOVE_THRESHOLD_FOR_CHUNK_UPDATE;

/// Something the renderer has to act on
#[derive(Debug, Clone)]
pub enum ChunkEvent {
    /// A chunk entered the table; place its object at `world_position` (x, z)
    ChunkCreated { coord: ChunkCoord, world_position: Vec2 },
    VisibilityChanged { coord: ChunkCoord, visible: bool },
    /// Show `mesh`, built at `lod` for `detail_levels[lod_index]`
    MeshAssigned {
        coord: ChunkCoord,
        lod_index: usize,
        lod: u32,
        mesh: Arc<MeshData>,
    },
    ColliderAssigned { coord: ChunkCoord, mesh: Arc<MeshData> },
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::ChunkCreated { coord, .. }
            | ChunkEvent::VisibilityChanged { coord, .. }
            | ChunkEvent::MeshAssigned { coord, .. }
            | ChunkEvent::ColliderAssigned { coord, .. } => *coord,
        }
    }
}

/// Snapshot of the chunk table for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    pub known: usize,
    pub loading: usize,
    pub visible: usize,
    pub cached_meshes: usize,
    pub requested_meshes: usize,
    pub colliders: usize,
}

/// Keeps the chunks around a moving viewer loaded at the right LOD.
///
/// Call [`TerrainStreamer::update`] once per tick with the viewer's (x, z)
/// position. Height maps and meshes are built on the injected [`WorkQueue`];
/// their results are applied at the start of the next `update`.
pub struct TerrainStreamer {
    config: TerrainConfig,
    queue: WorkQueue<TerrainStreamer>,

    chunks: HashMap<ChunkCoord, TerrainChunk>,
    visible_chunks: Vec<ChunkCoord>,
    events: Vec<ChunkEvent>,

    viewer: Vec2,
    viewer_old: Vec2,
    has_refreshed: bool,

    mesh_world_size: f32,
    chunks_visible_in_view_dst: i32,
}

impl TerrainStreamer {
    /// Panics if the LOD table is malformed
    pub fn new(config: TerrainConfig, queue: WorkQueue<TerrainStreamer>) -> Self {
        let config = config.validated();
        validate_detail_levels(&config.detail_levels, config.collider_lod_index);

        let mesh_world_size = config.mesh.mesh_world_size();
        let max_view_dst = config.max_view_dst();
        let chunks_visible_in_view_dst = (max_view_dst / mesh_world_size).ceil() as i32;

        log::info!(
            "Terrain streamer: chunk {} verts/line, {} world units, view distance {} ({} rings), {} LOD levels",
            config.mesh.num_verts_per_line(),
            mesh_world_size,
            max_view_dst,
            chunks_visible_in_view_dst,
            config.detail_levels.len()
        );

        Self {
            config,
            queue,
            chunks: HashMap::new(),
            visible_chunks: Vec::new(),
            events: Vec::new(),
            viewer: Vec2::ZERO,
            viewer_old: Vec2::ZERO,
            has_refreshed: false,
            mesh_world_size,
            chunks_visible_in_view_dst,
        }
    }

    /// Advance one tick and return what the renderer needs to apply
    pub fn update(&mut self, viewer: Vec2) -> Vec<ChunkEvent> {
        self.viewer = viewer;

        // The queue handle is cloned so deliveries can borrow the streamer mutably
        let queue = self.queue.clone();
        let delivered = queue.drain(self);
        if delivered > 0 {
            log::trace!("Applied {} worker results", delivered);
        }

        if !self.has_refreshed {
            self.has_refreshed = true;
            self.viewer_old = viewer;
            self.refresh();
        }

        if self.viewer != self.viewer_old {
            for coord in self.visible_chunks.clone() {
                self.update_collision_mesh(coord);
            }
        }

        if (self.viewer_old - self.viewer).length_squared() > SQR_VIEWER_MOVE_THRESHOLD_FOR_CHUNK_UPDATE {
            self.viewer_old = self.viewer;
            self.refresh();
        }

        self.take_events()
    }

    /// Update every visible chunk, then every chunk within view range of the
    /// viewer, creating the ones not seen before
    pub fn refresh(&mut self) {
        let mut already_updated = HashSet::new();
        for coord in self.visible_chunks.clone().into_iter().rev() {
            already_updated.insert(coord);
            self.update_chunk(coord);
        }

        let current = self.viewer_chunk_coord();
        let range = self.chunks_visible_in_view_dst;
        let mut created = 0;

        for z_offset in -range..=range {
            for x_offset in -range..=range {
                let coord = ChunkCoord::new(current.x + x_offset, current.z + z_offset);
                if already_updated.contains(&coord) {
                    continue;
                }
                if self.chunks.contains_key(&coord) {
                    self.update_chunk(coord);
                } else {
                    self.create_chunk(coord);
                    created += 1;
                }
            }
        }

        if created > 0 {
            log::debug!(
                "Requesting {} new chunks around ({}, {}), {} known",
                created,
                current.x,
                current.z,
                self.chunks.len()
            );
        }
    }

    fn create_chunk(&mut self, coord: ChunkCoord) {
        let chunk = TerrainChunk::new(coord, &self.config.mesh, &self.config.detail_levels);
        self.events.push(ChunkEvent::ChunkCreated { coord, world_position: chunk.bounds.centre });
        chunk.load(&self.queue, &self.config.height_map, self.config.mesh.num_verts_per_line());
        self.chunks.insert(coord, chunk);
    }

    fn update_chunk(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let mut ctx = ChunkContext {
            viewer: self.viewer,
            queue: &self.queue,
            mesh_settings: &self.config.mesh,
            detail_levels: &self.config.detail_levels,
            collider_lod_index: self.config.collider_lod_index,
            events: &mut self.events,
        };
        if let Some(visible) = chunk.update(&mut ctx) {
            self.on_visibility_changed(coord, visible);
        }
    }

    fn update_collision_mesh(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return;
        };
        let mut ctx = ChunkContext {
            viewer: self.viewer,
            queue: &self.queue,
            mesh_settings: &self.config.mesh,
            detail_levels: &self.config.detail_levels,
            collider_lod_index: self.config.collider_lod_index,
            events: &mut self.events,
        };
        chunk.update_collision_mesh(&mut ctx);
    }

    fn on_visibility_changed(&mut self, coord: ChunkCoord, visible: bool) {
        if visible {
            if !self.visible_chunks.contains(&coord) {
                self.visible_chunks.push(coord);
            }
        } else {
            self.visible_chunks.retain(|c| *c != coord);
        }
    }

    pub(crate) fn on_height_map_received(&mut self, coord: ChunkCoord, height_map: HeightMap) {
        if let Some(chunk) = self.chunks.get_mut(&coord) {
            chunk.set_height_map(Arc::new(height_map));
        }
        self.update_chunk(coord);
    }

    pub(crate) fn on_mesh_data_received(&mut self, coord: ChunkCoord, lod_index: usize, mesh: MeshData) {
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            log::warn!("Mesh for unknown chunk ({}, {}) dropped", coord.x, coord.z);
            return;
        };
        log::trace!(
            "Mesh for ({}, {}) LOD index {}: {} triangles",
            coord.x,
            coord.z,
            lod_index,
            mesh.triangle_count()
        );
        chunk.set_mesh(lod_index, Arc::new(mesh));

        self.update_chunk(coord);
        if lod_index == self.config.collider_lod_index {
            self.update_collision_mesh(coord);
        }
    }

    /// Events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> StreamerStats {
        let mut stats = StreamerStats {
            known: self.chunks.len(),
            visible: self.visible_chunks.len(),
            ..Default::default()
        };
        for chunk in self.chunks.values() {
            if chunk.height_map().is_none() {
                stats.loading += 1;
            }
            if chunk.has_set_collider() {
                stats.colliders += 1;
            }
            for mesh in chunk.lod_meshes() {
                match mesh {
                    MeshState::Cached(_) => stats.cached_meshes += 1,
                    MeshState::Requested => stats.requested_meshes += 1,
                    MeshState::NotRequested => {}
                }
            }
        }
        stats
    }

    /// Chunks still waiting on a height map or mesh although the queue has
    /// nothing left to run or deliver; a worker for them must have died
    pub fn stalled_chunks(&self) -> Vec<ChunkCoord> {
        if self.queue.in_flight() > 0 || self.queue.pending() > 0 {
            return Vec::new();
        }
        let mut stalled: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|chunk| {
                chunk.height_map().is_none()
                    || chunk.lod_meshes().iter().any(|mesh| matches!(mesh, MeshState::Requested))
            })
            .map(|chunk| chunk.coord)
            .collect();
        stalled.sort();
        stalled
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible_chunks
    }

    pub fn viewer_position(&self) -> Vec2 {
        self.viewer
    }

    pub fn viewer_chunk_coord(&self) -> ChunkCoord {
        ChunkCoord::from_world_pos(self.viewer, self.mesh_world_size)
    }

    pub fn mesh_world_size(&self) -> f32 {
        self.mesh_world_size
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn queue(&self) -> &WorkQueue<TerrainStreamer> {
        &self.queue
    }

    /// World-space height range the texture shader should map onto [0, 1]
    pub fn height_range(&self) -> (f32, f32) {
        (self.config.height_map.min_height(), self.config.height_map.max_height())
    }

    /// Terrain height under `world_pos` (x, z), bilinear between height map
    /// samples. `None` until the chunk there has its height map.
    pub fn height_at(&self, world_pos: Vec2) -> Option<f32> {
        let coord = ChunkCoord::from_world_pos(world_pos, self.mesh_world_size);
        let height_map = self.chunks.get(&coord)?.height_map()?;

        let n = height_map.width();
        let half = (n - 3) as f32 / 2.0;
        let local = (world_pos - coord.world_centre(self.mesh_world_size)) / self.config.mesh.mesh_scale;

        // Grid x grows with world x, grid y grows against world z
        let gx = (1.0 + half + local.x).clamp(0.0, (n - 1) as f32);
        let gy = (1.0 + half - local.y).clamp(0.0, (n - 1) as f32);

        let x0 = (gx.floor() as usize).min(n - 2);
        let y0 = (gy.floor() as usize).min(n - 2);
        let tx = gx - x0 as f32;
        let ty = gy - y0 as f32;

        let top = height_map.get(x0, y0) * (1.0 - tx) + height_map.get(x0 + 1, y0) * tx;
        let bottom = height_map.get(x0, y0 + 1) * (1.0 - tx) + height_map.get(x0 + 1, y0 + 1) * tx;
        Some(top * (1.0 - ty) + bottom * ty)
    }
}
