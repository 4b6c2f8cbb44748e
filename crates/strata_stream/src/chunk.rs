use std::sync::Arc;

use glam::Vec2;
use strata_mesh::{generate_terrain_mesh, MeshData, MeshSettings};
use strata_noise::{generate_height_map, HeightMap, HeightMapSettings};

use crate::lod::{select_lod_index, LodInfo};
use crate::streamer::{ChunkEvent, TerrainStreamer};
use crate::work_queue::WorkQueue;

/// Viewer must be this close to a chunk edge before its collider is assigned
pub const COLLIDER_GENERATION_DISTANCE_THRESHOLD: f32 = 5.0;

/// Coordinates for a chunk in chunk space (not world space)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk whose centre is nearest to `world_pos` (x, z). A position exactly
    /// on a chunk boundary goes to the even coordinate.
    pub fn from_world_pos(world_pos: Vec2, mesh_world_size: f32) -> Self {
        Self {
            x: (world_pos.x / mesh_world_size).round_ties_even() as i32,
            z: (world_pos.y / mesh_world_size).round_ties_even() as i32,
        }
    }

    pub fn world_centre(&self, mesh_world_size: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.z as f32) * mesh_world_size
    }
}

/// Axis-aligned square on the XZ plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub centre: Vec2,
    pub size: Vec2,
}

impl Bounds2 {
    pub fn new(centre: Vec2, size: Vec2) -> Self {
        Self { centre, size }
    }

    /// Squared distance from `point` to the nearest point of the bounds; zero inside
    pub fn sqr_distance(&self, point: Vec2) -> f32 {
        let half = self.size * 0.5;
        let outside = ((point - self.centre).abs() - half).max(Vec2::ZERO);
        outside.length_squared()
    }
}

/// Progress of one LOD mesh of a chunk
#[derive(Debug, Clone, Default)]
pub enum MeshState {
    #[default]
    NotRequested,
    Requested,
    Cached(Arc<MeshData>),
}

impl MeshState {
    /// True once a request went out, including after the result arrived
    pub fn has_requested(&self) -> bool {
        !matches!(self, MeshState::NotRequested)
    }

    pub fn mesh(&self) -> Option<&Arc<MeshData>> {
        match self {
            MeshState::Cached(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Coarse lifecycle of a chunk as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Height map still generating
    Loading,
    Visible,
    Hidden,
}

/// Everything a chunk needs from the streamer while it updates
pub(crate) struct ChunkContext<'a> {
    pub viewer: Vec2,
    pub queue: &'a WorkQueue<TerrainStreamer>,
    pub mesh_settings: &'a MeshSettings,
    pub detail_levels: &'a [LodInfo],
    pub collider_lod_index: usize,
    pub events: &'a mut Vec<ChunkEvent>,
}

/// One square of terrain: its height map and a lazily built mesh per LOD entry
#[derive(Debug)]
pub struct TerrainChunk {
    pub coord: ChunkCoord,
    pub sample_centre: Vec2,
    pub bounds: Bounds2,
    height_map: Option<Arc<HeightMap>>,
    lod_meshes: Vec<MeshState>,
    previous_lod_index: Option<usize>,
    visible: bool,
    has_set_collider: bool,
    max_view_dst: f32,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, mesh_settings: &MeshSettings, detail_levels: &[LodInfo]) -> Self {
        let mesh_world_size = mesh_settings.mesh_world_size();
        let position = coord.world_centre(mesh_world_size);

        Self {
            coord,
            // In noise-grid units, so neighbouring chunks share their edge samples
            sample_centre: Vec2::new(coord.x as f32, coord.z as f32) * mesh_world_size / mesh_settings.mesh_scale,
            bounds: Bounds2::new(position, Vec2::splat(mesh_world_size)),
            height_map: None,
            lod_meshes: vec![MeshState::NotRequested; detail_levels.len()],
            previous_lod_index: None,
            visible: false,
            has_set_collider: false,
            max_view_dst: detail_levels.last().map_or(0.0, |level| level.visible_dst_threshold),
        }
    }

    /// Kick off height map generation for this chunk
    pub(crate) fn load(
        &self,
        queue: &WorkQueue<TerrainStreamer>,
        height_map_settings: &HeightMapSettings,
        num_verts_per_line: usize,
    ) {
        let coord = self.coord;
        let sample_centre = self.sample_centre;
        let settings = height_map_settings.clone();

        queue.submit(
            move || generate_height_map(num_verts_per_line, num_verts_per_line, &settings, sample_centre),
            move |height_map, streamer: &mut TerrainStreamer| {
                streamer.on_height_map_received(coord, height_map)
            },
        );
    }

    pub fn set_height_map(&mut self, height_map: Arc<HeightMap>) {
        self.height_map = Some(height_map);
    }

    pub fn set_mesh(&mut self, lod_index: usize, mesh: Arc<MeshData>) {
        self.lod_meshes[lod_index] = MeshState::Cached(mesh);
    }

    /// Re-evaluate visibility and LOD against the viewer.
    /// Returns the new visibility if it changed.
    pub(crate) fn update(&mut self, ctx: &mut ChunkContext) -> Option<bool> {
        if self.height_map.is_none() {
            return None;
        }

        let viewer_dst_from_nearest_edge = self.bounds.sqr_distance(ctx.viewer).sqrt();
        let was_visible = self.visible;
        let visible = viewer_dst_from_nearest_edge <= self.max_view_dst;

        if visible {
            let lod_index = select_lod_index(ctx.detail_levels, viewer_dst_from_nearest_edge);

            if Some(lod_index) != self.previous_lod_index {
                let cached = self.lod_meshes[lod_index].mesh().cloned();
                match cached {
                    Some(mesh) => {
                        self.previous_lod_index = Some(lod_index);
                        ctx.events.push(ChunkEvent::MeshAssigned {
                            coord: self.coord,
                            lod_index,
                            lod: ctx.detail_levels[lod_index].lod,
                            mesh,
                        });
                    }
                    None if !self.lod_meshes[lod_index].has_requested() => self.request_mesh(lod_index, ctx),
                    None => {}
                }
            }
        }

        if was_visible != visible {
            self.visible = visible;
            ctx.events.push(ChunkEvent::VisibilityChanged { coord: self.coord, visible });
            return Some(visible);
        }
        None
    }

    /// Request the collider mesh once the viewer is near, assign it once the viewer is
    /// practically on top of the chunk. Never revisited after assignment.
    pub(crate) fn update_collision_mesh(&mut self, ctx: &mut ChunkContext) {
        if self.has_set_collider {
            return;
        }

        let sqr_dst_from_viewer_to_edge = self.bounds.sqr_distance(ctx.viewer);
        let collider_lod_index = ctx.collider_lod_index;

        if sqr_dst_from_viewer_to_edge < ctx.detail_levels[collider_lod_index].sqr_visible_dst_threshold()
            && !self.lod_meshes[collider_lod_index].has_requested()
        {
            self.request_mesh(collider_lod_index, ctx);
        }

        if sqr_dst_from_viewer_to_edge
            < COLLIDER_GENERATION_DISTANCE_THRESHOLD * COLLIDER_GENERATION_DISTANCE_THRESHOLD
        {
            if let Some(mesh) = self.lod_meshes[collider_lod_index].mesh() {
                ctx.events.push(ChunkEvent::ColliderAssigned {
                    coord: self.coord,
                    mesh: Arc::clone(mesh),
                });
                self.has_set_collider = true;
                log::debug!("Collider set for chunk ({}, {})", self.coord.x, self.coord.z);
            }
        }
    }

    /// Triangulate the height map for `detail_levels[lod_index]` on a worker
    fn request_mesh(&mut self, lod_index: usize, ctx: &ChunkContext) {
        let Some(height_map) = self.height_map.clone() else {
            return;
        };

        self.lod_meshes[lod_index] = MeshState::Requested;

        let coord = self.coord;
        let lod = ctx.detail_levels[lod_index].lod;
        let mesh_settings = ctx.mesh_settings.clone();

        ctx.queue.submit(
            move || generate_terrain_mesh(&height_map, &mesh_settings, lod),
            move |mesh, streamer: &mut TerrainStreamer| {
                streamer.on_mesh_data_received(coord, lod_index, mesh)
            },
        );
    }

    pub fn height_map(&self) -> Option<&Arc<HeightMap>> {
        self.height_map.as_ref()
    }

    pub fn lod_meshes(&self) -> &[MeshState] {
        &self.lod_meshes
    }

    pub fn previous_lod_index(&self) -> Option<usize> {
        self.previous_lod_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_set_collider(&self) -> bool {
        self.has_set_collider
    }

    pub fn state(&self) -> ChunkState {
        match (&self.height_map, self.visible) {
            (None, _) => ChunkState::Loading,
            (Some(_), true) => ChunkState::Visible,
            (Some(_), false) => ChunkState::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_rounds_to_nearest_centre() {
        let w = 100.0;
        assert_eq!(ChunkCoord::from_world_pos(Vec2::new(0.0, 0.0), w), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world_pos(Vec2::new(49.0, -49.0), w), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world_pos(Vec2::new(51.0, -51.0), w), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::new(-2, 3).world_centre(w), Vec2::new(-200.0, 300.0));
    }

    #[test]
    fn test_coord_boundary_goes_to_even() {
        let w = 50.0;
        assert_eq!(ChunkCoord::from_world_pos(Vec2::new(25.0, -25.0), w), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world_pos(Vec2::new(75.0, -75.0), w), ChunkCoord::new(2, -2));
        assert_eq!(ChunkCoord::from_world_pos(Vec2::new(125.0, 175.0), w), ChunkCoord::new(2, 4));
    }

    #[test]
    fn test_bounds_distance() {
        let bounds = Bounds2::new(Vec2::new(100.0, 0.0), Vec2::splat(50.0));
        assert_eq!(bounds.sqr_distance(Vec2::new(110.0, 10.0)), 0.0);
        assert_eq!(bounds.sqr_distance(Vec2::new(0.0, 0.0)), 75.0 * 75.0);
        // Nearest point is the corner (75, 25)
        assert_eq!(bounds.sqr_distance(Vec2::new(72.0, 29.0)), 9.0 + 16.0);
    }

    #[test]
    fn test_new_chunk_geometry() {
        let mesh_settings = MeshSettings { mesh_scale: 2.0, chunk_size_index: 0, ..Default::default() };
        let levels = [LodInfo::new(0, 80.0), LodInfo::new(2, 300.0)];
        let chunk = TerrainChunk::new(ChunkCoord::new(1, -1), &mesh_settings, &levels);

        // 48 + 5 verts per line, (53 - 3) * 2 world units wide
        assert_eq!(chunk.bounds.size, Vec2::splat(100.0));
        assert_eq!(chunk.bounds.centre, Vec2::new(100.0, -100.0));
        assert_eq!(chunk.sample_centre, Vec2::new(50.0, -50.0));
        assert_eq!(chunk.lod_meshes().len(), 2);
        assert_eq!(chunk.state(), ChunkState::Loading);
        assert!(!chunk.is_visible());
    }

    #[test]
    fn test_mesh_state_flags() {
        assert!(!MeshState::NotRequested.has_requested());
        assert!(MeshState::Requested.has_requested());
        let cached = MeshState::Cached(Arc::new(MeshData::default()));
        assert!(cached.has_requested());
        assert!(cached.mesh().is_some());
    }
}
