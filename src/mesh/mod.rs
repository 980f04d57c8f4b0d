//! Isosurface extraction and mesh buffers

pub mod buffer;
pub mod marching_cubes;
pub mod tables;

pub use buffer::{MeshData, Vertex, VertexBuffer};
pub use marching_cubes::{cube_configuration, extract};
