use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Where a grid vertex lives once the mesh is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexRef {
    /// Index into the rendered vertex buffer
    Mesh(u32),
    /// Index into the border buffer used only for normals
    OutOfMesh(u32),
}

/// An interpolated vertex on the edge-connection ring and the two main
/// vertices it sits between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeConnectionVertex {
    pub vertex_index: u32,
    pub main_vertex_a: u32,
    pub main_vertex_b: u32,
    pub dst_percent_from_a_to_b: f32,
}

/// Interleaved vertex handed to a renderer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Mesh buffers for one chunk at one LOD.
///
/// Filled by the triangulator, then finalized once with [`MeshData::process`].
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<u32>,
    normals: Vec<Vec3>,

    out_of_mesh_vertices: Vec<Vec3>,
    out_of_mesh_triangles: Vec<[VertexRef; 3]>,

    edge_connection_vertices: Vec<EdgeConnectionVertex>,
    use_flat_shading: bool,
    processed: bool,
}

impl MeshData {
    /// Allocate buffers sized for a `num_verts_per_line` grid at `skip_increment`
    pub fn new(num_verts_per_line: usize, skip_increment: usize, use_flat_shading: bool) -> Self {
        let n = num_verts_per_line;
        let size = n - 5;

        let num_mesh_edge_vertices = (n - 2) * 4 - 4;
        let num_edge_connection_vertices = (size - size / skip_increment) * 4;
        let num_main_vertices_per_line = size / skip_increment + 1;
        let num_main_vertices = num_main_vertices_per_line * num_main_vertices_per_line;
        let vertex_count = num_mesh_edge_vertices + num_edge_connection_vertices + num_main_vertices;

        let num_mesh_edge_triangles = 8 * (n - 4);
        let num_main_triangles = (num_main_vertices_per_line - 1) * (num_main_vertices_per_line - 1) * 2;

        Self {
            vertices: vec![Vec3::ZERO; vertex_count],
            uvs: vec![Vec2::ZERO; vertex_count],
            triangles: Vec::with_capacity((num_mesh_edge_triangles + num_main_triangles) * 3),
            normals: Vec::new(),
            out_of_mesh_vertices: vec![Vec3::ZERO; n * 4 - 4],
            out_of_mesh_triangles: Vec::with_capacity(8 * (n - 2)),
            edge_connection_vertices: Vec::with_capacity(num_edge_connection_vertices),
            use_flat_shading,
            processed: false,
        }
    }

    pub fn add_vertex(&mut self, position: Vec3, uv: Vec2, vertex: VertexRef) {
        match vertex {
            VertexRef::Mesh(i) => {
                self.vertices[i as usize] = position;
                self.uvs[i as usize] = uv;
            }
            VertexRef::OutOfMesh(i) => {
                self.out_of_mesh_vertices[i as usize] = position;
            }
        }
    }

    pub fn add_triangle(&mut self, a: VertexRef, b: VertexRef, c: VertexRef) {
        match (a, b, c) {
            (VertexRef::Mesh(a), VertexRef::Mesh(b), VertexRef::Mesh(c)) => {
                self.triangles.extend_from_slice(&[a, b, c]);
            }
            _ => self.out_of_mesh_triangles.push([a, b, c]),
        }
    }

    pub fn declare_edge_connection_vertex(&mut self, data: EdgeConnectionVertex) {
        self.edge_connection_vertices.push(data);
    }

    /// Finalize normals (or expand for flat shading). Idempotent.
    pub fn process(&mut self) {
        if self.processed {
            return;
        }
        if self.use_flat_shading {
            self.flat_shading();
        } else {
            self.normals = self.calculate_normals();
            self.process_edge_connection_vertices();
        }
        self.processed = true;
    }

    fn position(&self, vertex: VertexRef) -> Vec3 {
        match vertex {
            VertexRef::Mesh(i) => self.vertices[i as usize],
            VertexRef::OutOfMesh(i) => self.out_of_mesh_vertices[i as usize],
        }
    }

    /// Unnormalized, so larger triangles weigh more
    fn surface_normal(&self, a: VertexRef, b: VertexRef, c: VertexRef) -> Vec3 {
        let point_a = self.position(a);
        let side_ab = self.position(b) - point_a;
        let side_ac = self.position(c) - point_a;
        side_ab.cross(side_ac)
    }

    fn calculate_normals(&self) -> Vec<Vec3> {
        let mut vertex_normals = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.triangles.chunks_exact(3) {
            let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
            let normal = self.surface_normal(VertexRef::Mesh(a), VertexRef::Mesh(b), VertexRef::Mesh(c));
            vertex_normals[a as usize] += normal;
            vertex_normals[b as usize] += normal;
            vertex_normals[c as usize] += normal;
        }

        // Border triangles only feed the in-mesh corners they touch
        for &[a, b, c] in &self.out_of_mesh_triangles {
            let normal = self.surface_normal(a, b, c);
            for corner in [a, b, c] {
                if let VertexRef::Mesh(i) = corner {
                    vertex_normals[i as usize] += normal;
                }
            }
        }

        for normal in &mut vertex_normals {
            *normal = normal.normalize_or_zero();
        }
        vertex_normals
    }

    fn process_edge_connection_vertices(&mut self) {
        for e in &self.edge_connection_vertices {
            let a = self.normals[e.main_vertex_a as usize];
            let b = self.normals[e.main_vertex_b as usize];
            self.normals[e.vertex_index as usize] =
                (a * (1.0 - e.dst_percent_from_a_to_b) + b * e.dst_percent_from_a_to_b).normalize_or_zero();
        }
    }

    fn flat_shading(&mut self) {
        let mut flat_vertices = Vec::with_capacity(self.triangles.len());
        let mut flat_uvs = Vec::with_capacity(self.triangles.len());
        let mut flat_normals = Vec::with_capacity(self.triangles.len());

        for triangle in self.triangles.chunks_exact(3) {
            let corners = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            let p = corners.map(|i| self.vertices[i]);
            let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize_or_zero();
            for (corner, position) in corners.iter().zip(p) {
                flat_vertices.push(position);
                flat_uvs.push(self.uvs[*corner]);
                flat_normals.push(face_normal);
            }
        }

        for (i, index) in self.triangles.iter_mut().enumerate() {
            *index = i as u32;
        }
        self.vertices = flat_vertices;
        self.uvs = flat_uvs;
        self.normals = flat_normals;
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Flat index list, three per triangle
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Empty until [`MeshData::process`] has run
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn out_of_mesh_vertices(&self) -> &[Vec3] {
        &self.out_of_mesh_vertices
    }

    pub fn out_of_mesh_triangles(&self) -> &[[VertexRef; 3]] {
        &self.out_of_mesh_triangles
    }

    pub fn edge_connection_vertices(&self) -> &[EdgeConnectionVertex] {
        &self.edge_connection_vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_flat_shaded(&self) -> bool {
        self.use_flat_shading
    }

    /// Interleave positions, normals and uvs for upload
    pub fn to_vertices(&self) -> Vec<TerrainVertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| TerrainVertex {
                position: position.to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
                uv: self.uvs[i].to_array(),
            })
            .collect()
    }
}
