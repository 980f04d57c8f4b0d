//! 3D density volumes
//!
//! Every volume (chunk stack, chunk, connector) uses the same linearization:
//! `x + z * nx + y * nx * nz`. z varies before y, and the mesher, the stack
//! slicer and the connector copies all depend on that order.

pub mod builder;

pub use builder::{carve, init_stack, slice_chunk, AIR_DENSITY, SOLID_DENSITY};

/// Node counts along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dims3 {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Dims3 {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    pub const fn cube(n: usize) -> Self {
        Self { x: n, y: n, z: n }
    }

    /// Total node count.
    pub const fn len(&self) -> usize {
        self.x * self.y * self.z
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit cubes along each axis (one fewer than nodes).
    pub fn cubes(&self) -> Dims3 {
        Dims3::new(
            self.x.saturating_sub(1),
            self.y.saturating_sub(1),
            self.z.saturating_sub(1),
        )
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.x && y < self.y && z < self.z
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(self.contains(x, y, z), "({}, {}, {}) outside {:?}", x, y, z, self);
        x + z * self.x + y * self.x * self.z
    }
}

/// Dense grid of signed density values. Positive is solid, negative is air.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityVolume {
    dims: Dims3,
    data: Vec<f32>,
}

impl DensityVolume {
    pub fn new_filled(dims: Dims3, value: f32) -> Self {
        Self {
            dims,
            data: vec![value; dims.len()],
        }
    }

    /// Wrap existing data. Returns `None` if the length does not match `dims`.
    pub fn from_vec(dims: Dims3, data: Vec<f32>) -> Option<Self> {
        (data.len() == dims.len()).then_some(Self { dims, data })
    }

    pub fn dims(&self) -> Dims3 {
        self.dims
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.dims.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) {
        let idx = self.dims.index(x, y, z);
        self.data[idx] = value;
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_z_before_y() {
        let dims = Dims3::new(2, 3, 4);
        assert_eq!(dims.index(1, 0, 0), 1);
        assert_eq!(dims.index(0, 0, 1), 2);
        assert_eq!(dims.index(0, 1, 0), 8);
        assert_eq!(dims.index(1, 2, 3), 1 + 3 * 2 + 2 * 8);
    }

    #[test]
    fn test_cubes_saturate() {
        assert_eq!(Dims3::cube(5).cubes(), Dims3::cube(4));
        assert_eq!(Dims3::new(1, 0, 3).cubes(), Dims3::new(0, 0, 2));
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(DensityVolume::from_vec(Dims3::cube(2), vec![0.0; 8]).is_some());
        assert!(DensityVolume::from_vec(Dims3::cube(2), vec![0.0; 7]).is_none());
    }

    #[test]
    fn test_get_set() {
        let mut volume = DensityVolume::new_filled(Dims3::new(3, 2, 2), AIR_DENSITY);
        volume.set(2, 1, 1, SOLID_DENSITY);
        assert_eq!(volume.get(2, 1, 1), SOLID_DENSITY);
        assert_eq!(volume.as_slice()[2 + 3 + 6], SOLID_DENSITY);
        assert_eq!(volume.as_slice().iter().filter(|&&v| v == SOLID_DENSITY).count(), 1);
    }

    proptest! {
        #[test]
        fn prop_index_is_a_bijection(nx in 1usize..7, ny in 1usize..7, nz in 1usize..7) {
            let dims = Dims3::new(nx, ny, nz);
            let mut seen = HashSet::new();
            for y in 0..ny {
                for z in 0..nz {
                    for x in 0..nx {
                        let idx = dims.index(x, y, z);
                        prop_assert!(idx < dims.len());
                        prop_assert!(seen.insert(idx));
                    }
                }
            }
            prop_assert_eq!(seen.len(), dims.len());
        }
    }
}
