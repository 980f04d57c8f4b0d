//! Seam volumes between neighbouring chunks
//!
//! Chunk `(cx, cy, cz)` places local node `i` at world `cx * N + i`, so two
//! neighbours leave a one-unit gap between their boundary planes. A connector
//! is a thin volume spanning that gap: along each axis it bridges, node 0 is
//! the last plane of the lower chunk and node 1 the first plane of the upper
//! one. Along the other axes it copies the chunk rows unchanged.
//!
//! Built families:
//! - faces, bridging one axis (two chunks)
//! - corners around a vertical edge, bridging x and z (four chunks)
//! - corners around a horizontal edge parallel to x, bridging y and z (four chunks)
//!
//! Not built: corners around edges parallel to z (bridging x and y), and the
//! single point where eight chunks meet. Both leave small holes in the seam.

use crate::mesh::{MeshData, VertexBuffer};
use crate::volume::{DensityVolume, Dims3};

use super::chunk::ChunkCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectorKind {
    /// Between `base` and `base + x`. Volume `2 × N × N`.
    FaceX,
    /// Between `base` and `base + y`. Volume `N × 2 × N`.
    FaceY,
    /// Between `base` and `base + z`. Volume `N × N × 2`.
    FaceZ,
    /// Around the vertical edge shared by the four chunks at `base + {0,1}x + {0,1}z`.
    /// Volume `2 × N × 2`.
    CornerAlongY,
    /// Around the edge parallel to x shared by the four chunks at
    /// `base + {0,1}y + {0,1}z`. Volume `N × 2 × 2`.
    CornerAlongX,
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 5] = [
        ConnectorKind::FaceX,
        ConnectorKind::FaceY,
        ConnectorKind::FaceZ,
        ConnectorKind::CornerAlongY,
        ConnectorKind::CornerAlongX,
    ];

    /// Axes (x, y, z) along which this connector spans two chunks.
    pub fn bridged_axes(self) -> [bool; 3] {
        match self {
            ConnectorKind::FaceX => [true, false, false],
            ConnectorKind::FaceY => [false, true, false],
            ConnectorKind::FaceZ => [false, false, true],
            ConnectorKind::CornerAlongY => [true, false, true],
            ConnectorKind::CornerAlongX => [false, true, true],
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(self, ConnectorKind::CornerAlongY | ConnectorKind::CornerAlongX)
    }

    pub fn dims(self, n: usize) -> Dims3 {
        let [bx, by, bz] = self.bridged_axes();
        let axis = |bridged: bool| if bridged { 2 } else { n };
        Dims3::new(axis(bx), axis(by), axis(bz))
    }

    /// Chunk offsets from the base that this connector reads, 0 or 1 per axis.
    pub fn offsets(self) -> Vec<[i32; 3]> {
        let [bx, by, bz] = self.bridged_axes();
        let span = |bridged: bool| if bridged { 0..=1 } else { 0..=0 };
        let mut offsets = Vec::with_capacity(4);
        for dy in span(by) {
            for dz in span(bz) {
                for dx in span(bx) {
                    offsets.push([dx, dy, dz]);
                }
            }
        }
        offsets
    }
}

/// Exact identity of a connector: its kind and the lowest chunk it touches.
///
/// The connector sits half a chunk above `base` on every bridged axis; see
/// [`ConnectorKey::half_grid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorKey {
    pub kind: ConnectorKind,
    pub base: ChunkCoord,
}

impl ConnectorKey {
    pub const fn new(kind: ConnectorKind, base: ChunkCoord) -> Self {
        Self { kind, base }
    }

    /// Every chunk this connector copies from.
    pub fn required_chunks(&self) -> Vec<ChunkCoord> {
        self.kind
            .offsets()
            .into_iter()
            .map(|[dx, dy, dz]| self.base.offset(dx, dy, dz))
            .collect()
    }

    /// Every connector key that `coord` takes part in, one per kind and
    /// position of `coord` within it.
    pub fn touching(coord: ChunkCoord) -> Vec<ConnectorKey> {
        ConnectorKind::ALL
            .iter()
            .flat_map(|&kind| {
                kind.offsets()
                    .into_iter()
                    .map(move |[dx, dy, dz]| ConnectorKey::new(kind, coord.offset(-dx, -dy, -dz)))
            })
            .collect()
    }

    /// Position in chunk units, with `.5` on the bridged axes.
    pub fn half_grid(&self) -> [f32; 3] {
        let bridged = self.kind.bridged_axes();
        let base = [self.base.x, self.base.y, self.base.z];
        let mut pos = [0.0; 3];
        for axis in 0..3 {
            pos[axis] = base[axis] as f32 + if bridged[axis] { 0.5 } else { 0.0 };
        }
        pos
    }

    /// World position of connector node (0, 0, 0).
    pub fn world_origin(&self, n: usize) -> [f32; 3] {
        let bridged = self.kind.bridged_axes();
        let mut origin = self.base.world_origin(n);
        for axis in 0..3 {
            if bridged[axis] {
                origin[axis] += (n - 1) as f32;
            }
        }
        origin
    }
}

impl std::fmt::Display for ConnectorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [x, y, z] = self.half_grid();
        write!(f, "{:?}({}, {}, {})", self.kind, x, y, z)
    }
}

/// Assemble the seam volume for `key` from chunk volumes of `n` nodes per
/// axis. Returns `None` when any required chunk is missing.
pub fn build_volume<'a, F>(key: &ConnectorKey, n: usize, lookup: F) -> Option<DensityVolume>
where
    F: Fn(ChunkCoord) -> Option<&'a DensityVolume>,
{
    // Sources indexed by offset bits: dx + 2 * dy + 4 * dz
    let mut sources: [Option<&DensityVolume>; 8] = [None; 8];
    for [dx, dy, dz] in key.kind.offsets() {
        let volume = lookup(key.base.offset(dx, dy, dz))?;
        sources[(dx + 2 * dy + 4 * dz) as usize] = Some(volume);
    }

    let bridged = key.kind.bridged_axes();
    let dims = key.kind.dims(n);
    let mut volume = DensityVolume::new_filled(dims, 0.0);

    // Map a connector node coordinate to (chunk offset, local coordinate).
    let source = |axis: usize, cell: usize| -> (usize, usize) {
        match (bridged[axis], cell) {
            (true, 0) => (0, n - 1),
            (true, _) => (1, 0),
            (false, _) => (0, cell),
        }
    };

    for y in 0..dims.y {
        let (oy, ly) = source(1, y);
        for z in 0..dims.z {
            let (oz, lz) = source(2, z);
            for x in 0..dims.x {
                let (ox, lx) = source(0, x);
                let chunk = sources[ox + 2 * oy + 4 * oz]?;
                volume.set(x, y, z, chunk.get(lx, ly, lz));
            }
        }
    }

    Some(volume)
}

/// Seam mesh between neighbouring chunks.
#[derive(Clone, Debug)]
pub struct Connector {
    key: ConnectorKey,
    volume: DensityVolume,
    vertices: VertexBuffer,
    mesh: Option<MeshData>,
}

impl Connector {
    pub fn new(key: ConnectorKey, volume: DensityVolume, vertices: VertexBuffer) -> Self {
        Self { key, volume, vertices, mesh: None }
    }

    pub fn key(&self) -> ConnectorKey {
        self.key
    }

    pub fn volume(&self) -> &DensityVolume {
        &self.volume
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        self.mesh.as_ref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.count()
    }

    pub(crate) fn finalize(&mut self, n: usize) {
        self.mesh = Some(MeshData::from_buffer(&self.vertices, self.key.world_origin(n)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    const N: usize = 3;

    /// Volume whose value encodes the chunk and the local node.
    fn tagged(coord: ChunkCoord) -> DensityVolume {
        let dims = Dims3::cube(N);
        let mut volume = DensityVolume::new_filled(dims, 0.0);
        for y in 0..N {
            for z in 0..N {
                for x in 0..N {
                    volume.set(x, y, z, tag(coord, x, y, z));
                }
            }
        }
        volume
    }

    fn tag(coord: ChunkCoord, x: usize, y: usize, z: usize) -> f32 {
        let chunk = (coord.x * 100 + coord.y * 10 + coord.z) as f32;
        chunk * 1000.0 + (x * 100 + y * 10 + z) as f32
    }

    fn grid(extent: i32) -> HashMap<ChunkCoord, DensityVolume> {
        let mut chunks = HashMap::new();
        for x in 0..extent {
            for y in 0..extent {
                for z in 0..extent {
                    let coord = ChunkCoord::new(x, y, z);
                    chunks.insert(coord, tagged(coord));
                }
            }
        }
        chunks
    }

    #[test]
    fn test_dims() {
        assert_eq!(ConnectorKind::FaceX.dims(N), Dims3::new(2, N, N));
        assert_eq!(ConnectorKind::FaceY.dims(N), Dims3::new(N, 2, N));
        assert_eq!(ConnectorKind::FaceZ.dims(N), Dims3::new(N, N, 2));
        assert_eq!(ConnectorKind::CornerAlongY.dims(N), Dims3::new(2, N, 2));
        assert_eq!(ConnectorKind::CornerAlongX.dims(N), Dims3::new(N, 2, 2));
    }

    #[test]
    fn test_required_chunks() {
        let base = ChunkCoord::new(1, 0, -1);
        let face = ConnectorKey::new(ConnectorKind::FaceX, base).required_chunks();
        assert_eq!(face, vec![base, ChunkCoord::new(2, 0, -1)]);

        let corner: HashSet<_> = ConnectorKey::new(ConnectorKind::CornerAlongY, base)
            .required_chunks()
            .into_iter()
            .collect();
        let expected: HashSet<_> = [(1, -1), (2, -1), (1, 0), (2, 0)]
            .iter()
            .map(|&(x, z)| ChunkCoord::new(x, 0, z))
            .collect();
        assert_eq!(corner, expected);
    }

    #[test]
    fn test_touching_is_inverse_of_required() {
        let coord = ChunkCoord::new(4, 1, -2);
        let keys = ConnectorKey::touching(coord);
        assert_eq!(keys.len(), 2 + 2 + 2 + 4 + 4);
        for key in keys {
            assert!(key.required_chunks().contains(&coord), "{}", key);
        }
    }

    #[test]
    fn test_face_x_copies_boundary_planes() {
        let chunks = grid(2);
        let key = ConnectorKey::new(ConnectorKind::FaceX, ChunkCoord::new(0, 1, 0));
        let volume = build_volume(&key, N, |c| chunks.get(&c)).unwrap();

        let a = ChunkCoord::new(0, 1, 0);
        let b = ChunkCoord::new(1, 1, 0);
        for y in 0..N {
            for z in 0..N {
                assert_eq!(volume.get(0, y, z), tag(a, N - 1, y, z));
                assert_eq!(volume.get(1, y, z), tag(b, 0, y, z));
            }
        }
    }

    #[test]
    fn test_corner_along_y_copies_four_columns() {
        let chunks = grid(2);
        let key = ConnectorKey::new(ConnectorKind::CornerAlongY, ChunkCoord::new(0, 0, 0));
        let volume = build_volume(&key, N, |c| chunks.get(&c)).unwrap();

        for y in 0..N {
            assert_eq!(volume.get(0, y, 0), tag(ChunkCoord::new(0, 0, 0), N - 1, y, N - 1));
            assert_eq!(volume.get(1, y, 0), tag(ChunkCoord::new(1, 0, 0), 0, y, N - 1));
            assert_eq!(volume.get(0, y, 1), tag(ChunkCoord::new(0, 0, 1), N - 1, y, 0));
            assert_eq!(volume.get(1, y, 1), tag(ChunkCoord::new(1, 0, 1), 0, y, 0));
        }
    }

    #[test]
    fn test_corner_along_x_copies_four_rows() {
        let chunks = grid(2);
        let key = ConnectorKey::new(ConnectorKind::CornerAlongX, ChunkCoord::new(1, 0, 0));
        let volume = build_volume(&key, N, |c| chunks.get(&c)).unwrap();

        for x in 0..N {
            assert_eq!(volume.get(x, 0, 0), tag(ChunkCoord::new(1, 0, 0), x, N - 1, N - 1));
            assert_eq!(volume.get(x, 1, 0), tag(ChunkCoord::new(1, 1, 0), x, 0, N - 1));
            assert_eq!(volume.get(x, 0, 1), tag(ChunkCoord::new(1, 0, 1), x, N - 1, 0));
            assert_eq!(volume.get(x, 1, 1), tag(ChunkCoord::new(1, 1, 1), x, 0, 0));
        }
    }

    #[test]
    fn test_missing_neighbour_builds_nothing() {
        let chunks = grid(2);
        let key = ConnectorKey::new(ConnectorKind::FaceZ, ChunkCoord::new(0, 0, 1));
        assert!(build_volume(&key, N, |c| chunks.get(&c)).is_none());
    }

    #[test]
    fn test_world_origin_fills_the_gap() {
        let key = ConnectorKey::new(ConnectorKind::CornerAlongY, ChunkCoord::new(-1, 2, 0));
        // base chunk's last node on x and z, first node on y
        assert_eq!(key.world_origin(5), [-1.0, 10.0, 4.0]);
        assert_eq!(key.half_grid(), [-0.5, 2.0, 0.5]);
    }
}
