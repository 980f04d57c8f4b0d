//! Marching cubes extraction over a [`DensityVolume`].
//!
//! Cubes are visited x-major, then z, then y. A corner counts as inside when
//! its density is strictly above the surface level; configurations 0 and 255
//! produce nothing. Vertices are not shared between triangles.

use crate::config::MeshFidelity;
use crate::volume::DensityVolume;

use super::buffer::{Vertex, VertexBuffer};
use super::tables::{CORNER_OFFSETS, EDGE_CORNERS, TRIANGLE_TABLE};

/// Triangulate the isosurface of `volume` at `surface_level`.
///
/// Positions are in the volume's local node space. The returned buffer has
/// room for five triangles per cube; only `count()` slots are meaningful.
pub fn extract(volume: &DensityVolume, surface_level: f32, fidelity: MeshFidelity) -> VertexBuffer {
    let cubes = volume.dims().cubes();
    let mut buffer = VertexBuffer::for_cubes(cubes.len());

    for x in 0..cubes.x {
        for z in 0..cubes.z {
            for y in 0..cubes.y {
                march_cube(volume, [x, y, z], surface_level, fidelity, &mut buffer);
            }
        }
    }

    buffer
}

/// Bit `i` set when corner `i` is inside the surface.
pub fn cube_configuration(corners: &[f32; 8], surface_level: f32) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > surface_level)
        .fold(0, |config, (i, _)| config | (1 << i))
}

fn march_cube(
    volume: &DensityVolume,
    cube: [usize; 3],
    surface_level: f32,
    fidelity: MeshFidelity,
    buffer: &mut VertexBuffer,
) {
    let mut values = [0.0f32; 8];
    let mut positions = [Vertex::default(); 8];
    for (i, offset) in CORNER_OFFSETS.iter().enumerate() {
        let (x, y, z) = (cube[0] + offset[0], cube[1] + offset[1], cube[2] + offset[2]);
        values[i] = volume.get(x, y, z);
        positions[i] = Vertex::new(x as f32, y as f32, z as f32);
    }

    let config = cube_configuration(&values, surface_level);
    if config == 0 || config == 255 {
        return;
    }

    let row = &TRIANGLE_TABLE[config];
    for tri in row.chunks_exact(3).take_while(|tri| tri[0] != -1) {
        let mut triangle = [Vertex::default(); 3];
        for (slot, &edge) in triangle.iter_mut().zip(tri) {
            let [a, b] = EDGE_CORNERS[edge as usize];
            *slot = edge_vertex(positions[a], positions[b], values[a], values[b], surface_level, fidelity);
        }
        buffer.push_triangle(triangle);
    }
}

/// Vertex on the edge from `p1` to `p2`.
fn edge_vertex(p1: Vertex, p2: Vertex, v1: f32, v2: f32, surface_level: f32, fidelity: MeshFidelity) -> Vertex {
    let t = match fidelity {
        MeshFidelity::Midpoint => 0.5,
        MeshFidelity::Interpolated => {
            if v1 == v2 {
                0.5
            } else {
                ((surface_level - v1) / (v2 - v1)).clamp(0.0, 1.0)
            }
        }
    };
    p1.lerp(p2, t)
}
