use glam::{Vec2, Vec3};
use strata_noise::HeightMap;

use crate::mesh_data::{EdgeConnectionVertex, MeshData, VertexRef};
use crate::settings::{MeshSettings, NUM_SUPPORTED_LODS};

/// Grid step between retained interior vertices at a given LOD
pub fn skip_increment(level_of_detail: u32) -> usize {
    if level_of_detail == 0 { 1 } else { level_of_detail as usize * 2 }
}

/// Role of one grid position in the triangulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexKind {
    /// Outermost ring, only used to shade the chunk edge
    OutOfMesh,
    /// Dropped by the LOD
    Skipped,
    /// Second ring, always full resolution so neighbours line up
    MeshEdge,
    /// Retained interior vertex on the LOD lattice
    Main,
    /// Third ring vertex between two main vertices
    EdgeConnection,
}

fn classify(x: usize, y: usize, n: usize, skip: usize) -> VertexKind {
    if x == 0 || y == 0 || x == n - 1 || y == n - 1 {
        return VertexKind::OutOfMesh;
    }
    if x == 1 || y == 1 || x == n - 2 || y == n - 2 {
        return VertexKind::MeshEdge;
    }

    let on_lattice = (x - 2) % skip == 0 && (y - 2) % skip == 0;
    let is_interior = x > 2 && x < n - 3 && y > 2 && y < n - 3;

    if on_lattice {
        VertexKind::Main
    } else if is_interior {
        VertexKind::Skipped
    } else {
        VertexKind::EdgeConnection
    }
}

/// Build the mesh for one chunk at `level_of_detail`.
///
/// The height map must be `num_verts_per_line` square. Its outer ring becomes
/// out-of-mesh geometry that only feeds normals, the next ring is always kept
/// at full resolution, and the third ring stitches that edge to the coarser
/// interior. Any two chunks built from a continuous height field therefore
/// share identical edge vertices whatever LOD each of them uses.
pub fn generate_terrain_mesh(height_map: &HeightMap, settings: &MeshSettings, level_of_detail: u32) -> MeshData {
    let settings = settings.validated();
    let n = settings.num_verts_per_line();
    let skip = skip_increment(level_of_detail);

    assert!(
        (level_of_detail as usize) < NUM_SUPPORTED_LODS,
        "Unsupported LOD {} (max {})",
        level_of_detail,
        NUM_SUPPORTED_LODS - 1
    );
    assert!(
        height_map.width() == n && height_map.height() == n,
        "Height map is {}x{}, mesh settings expect {}x{}",
        height_map.width(),
        height_map.height(),
        n,
        n
    );

    let mesh_world_size = settings.mesh_world_size();
    let top_left = Vec2::new(-1.0, 1.0) * mesh_world_size / 2.0;

    let mut mesh_data = MeshData::new(n, skip, settings.use_flat_shading);

    // Row-major so in-mesh indices follow the same order vertices are added in
    let mut vertex_indices: Vec<Option<VertexRef>> = vec![None; n * n];
    let mut mesh_vertex_index = 0u32;
    let mut out_of_mesh_vertex_index = 0u32;

    for y in 0..n {
        for x in 0..n {
            match classify(x, y, n, skip) {
                VertexKind::Skipped => {}
                VertexKind::OutOfMesh => {
                    vertex_indices[y * n + x] = Some(VertexRef::OutOfMesh(out_of_mesh_vertex_index));
                    out_of_mesh_vertex_index += 1;
                }
                _ => {
                    vertex_indices[y * n + x] = Some(VertexRef::Mesh(mesh_vertex_index));
                    mesh_vertex_index += 1;
                }
            }
        }
    }

    let index_at = |x: usize, y: usize| -> VertexRef {
        vertex_indices[y * n + x].unwrap_or_else(|| panic!("No vertex at ({}, {}) for skip {}", x, y, skip))
    };

    for y in 0..n {
        for x in 0..n {
            let kind = classify(x, y, n, skip);
            if kind == VertexKind::Skipped {
                continue;
            }

            let vertex = index_at(x, y);
            let percent = Vec2::new(x as f32 - 1.0, y as f32 - 1.0) / (n - 3) as f32;
            let position_2d = top_left + Vec2::new(percent.x, -percent.y) * mesh_world_size;
            let mut height = height_map.get(x, y);

            if kind == VertexKind::EdgeConnection {
                let is_vertical = x == 2 || x == n - 3;
                let dst_to_main_a = (if is_vertical { y - 2 } else { x - 2 }) % skip;
                let dst_to_main_b = skip - dst_to_main_a;
                let dst_percent_from_a_to_b = dst_to_main_a as f32 / skip as f32;

                let (coord_a, coord_b) = if is_vertical {
                    ((x, y - dst_to_main_a), (x, y + dst_to_main_b))
                } else {
                    ((x - dst_to_main_a, y), (x + dst_to_main_b, y))
                };

                let height_a = height_map.get(coord_a.0, coord_a.1);
                let height_b = height_map.get(coord_b.0, coord_b.1);
                height = height_a * (1.0 - dst_percent_from_a_to_b) + height_b * dst_percent_from_a_to_b;

                if let (VertexRef::Mesh(v), VertexRef::Mesh(a), VertexRef::Mesh(b)) =
                    (vertex, index_at(coord_a.0, coord_a.1), index_at(coord_b.0, coord_b.1))
                {
                    mesh_data.declare_edge_connection_vertex(EdgeConnectionVertex {
                        vertex_index: v,
                        main_vertex_a: a,
                        main_vertex_b: b,
                        dst_percent_from_a_to_b,
                    });
                }
            }

            mesh_data.add_vertex(Vec3::new(position_2d.x, height, position_2d.y), percent, vertex);

            // Edge-connection vertices on the top/left rows are covered by the
            // quads of their neighbours
            let create_triangle = x < n - 1
                && y < n - 1
                && (kind != VertexKind::EdgeConnection || (x != 2 && y != 2));

            if create_triangle {
                let increment = if kind == VertexKind::Main && x != n - 3 && y != n - 3 { skip } else { 1 };

                let a = index_at(x, y);
                let b = index_at(x + increment, y);
                let c = index_at(x, y + increment);
                let d = index_at(x + increment, y + increment);
                mesh_data.add_triangle(a, d, c);
                mesh_data.add_triangle(d, a, b);
            }
        }
    }

    mesh_data.process();

    log::trace!(
        "Triangulated {}x{} grid at LOD {}: {} vertices, {} triangles",
        n,
        n,
        level_of_detail,
        mesh_data.vertices().len(),
        mesh_data.triangle_count()
    );

    mesh_data
}
