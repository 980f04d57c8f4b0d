use crate::mesh::{MeshData, VertexBuffer};
use crate::volume::DensityVolume;

/// Integer position of a chunk in the grid. `y` indexes the vertical stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Column this chunk belongs to.
    pub fn column(&self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// World position of local node (0, 0, 0) for chunks of `n` nodes per axis.
    pub fn world_origin(&self, n: usize) -> [f32; 3] {
        let n = n as f32;
        [self.x as f32 * n, self.y as f32 * n, self.z as f32 * n]
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One meshed cube of terrain. Owns its density slice and vertex buffer.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    volume: DensityVolume,
    vertices: VertexBuffer,
    mesh: Option<MeshData>,
}

impl Chunk {
    pub fn new(coord: ChunkCoord, volume: DensityVolume, vertices: VertexBuffer) -> Self {
        Self { coord, volume, vertices, mesh: None }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn volume(&self) -> &DensityVolume {
        &self.volume
    }

    /// Raw marching cubes output in local node space.
    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    /// World-space mesh, available once the build has been finalized.
    pub fn mesh(&self) -> Option<&MeshData> {
        self.mesh.as_ref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.count()
    }

    pub(crate) fn finalize(&mut self, n: usize) {
        self.mesh = Some(MeshData::from_buffer(&self.vertices, self.coord.world_origin(n)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{Dims3, AIR_DENSITY};

    #[test]
    fn test_world_origin() {
        assert_eq!(ChunkCoord::new(-2, 1, 3).world_origin(5), [-10.0, 5.0, 15.0]);
    }

    #[test]
    fn test_finalize_builds_mesh() {
        let volume = DensityVolume::new_filled(Dims3::cube(3), AIR_DENSITY);
        let mut chunk = Chunk::new(ChunkCoord::new(1, 0, 0), volume, VertexBuffer::for_cubes(8));
        assert!(chunk.mesh().is_none());
        chunk.finalize(3);
        let mesh = chunk.mesh().unwrap();
        assert_eq!(mesh.origin, [3.0, 0.0, 0.0]);
        assert!(mesh.is_empty());
    }
}
