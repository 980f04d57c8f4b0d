use bytemuck::{Pod, Zeroable};

use super::tables::MAX_VERTICES_PER_CUBE;

/// Mesh vertex position.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn offset(self, origin: [f32; 3]) -> Self {
        Self::new(self.x + origin[0], self.y + origin[1], self.z + origin[2])
    }

    /// Point `t` of the way from `self` to `other`.
    pub fn lerp(self, other: Vertex, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    fn sub(self, other: Vertex) -> [f32; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }
}

/// Preallocated output of one extraction: room for the worst case of every
/// cube plus the number of slots actually written.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexBuffer {
    data: Vec<Vertex>,
    count: usize,
}

impl VertexBuffer {
    /// Buffer sized for `cubes` cubes at five triangles each.
    pub fn for_cubes(cubes: usize) -> Self {
        Self {
            data: vec![Vertex::default(); cubes * MAX_VERTICES_PER_CUBE],
            count: 0,
        }
    }

    pub(crate) fn push_triangle(&mut self, triangle: [Vertex; 3]) {
        debug_assert!(self.count + 3 <= self.data.len(), "vertex buffer overflow");
        self.data[self.count..self.count + 3].copy_from_slice(&triangle);
        self.count += 3;
    }

    /// Written vertices; every consecutive three form a triangle.
    pub fn as_slice(&self) -> &[Vertex] {
        &self.data[..self.count]
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Final renderable mesh in world space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub origin: [f32; 3],
    pub positions: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Copy the written part of `buffer`, shifted by `origin`. Vertices are
    /// not shared, so the index list is just `0..count`.
    pub fn from_buffer(buffer: &VertexBuffer, origin: [f32; 3]) -> Self {
        let positions: Vec<Vertex> = buffer.as_slice().iter().map(|v| v.offset(origin)).collect();
        let indices = (0..positions.len() as u32).collect();
        Self { origin, positions, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Unit normal of each triangle, `[0, 0, 0]` for degenerate ones.
    pub fn face_normals(&self) -> Vec<[f32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let a = self.positions[tri[0] as usize];
                let b = self.positions[tri[1] as usize];
                let c = self.positions[tri[2] as usize];
                let u = b.sub(a);
                let v = c.sub(a);
                let n = [
                    u[1] * v[2] - u[2] * v[1],
                    u[2] * v[0] - u[0] * v[2],
                    u[0] * v[1] - u[1] * v[0],
                ];
                let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                if len > f32::EPSILON {
                    [n[0] / len, n[1] / len, n[2] / len]
                } else {
                    [0.0; 3]
                }
            })
            .collect()
    }

    /// Positions as tightly packed native-endian `f32` triples, ready for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
