//! Turn a 2D height plane into a 3D density stack, then cut the stack into chunks.

use crate::curve::SampledCurve;
use crate::field::ScalarField2D;

use super::{DensityVolume, Dims3};

/// Density of an empty cell.
pub const AIR_DENSITY: f32 = -1.0;
/// Density of a filled cell.
pub const SOLID_DENSITY: f32 = 1.0;

/// Allocate a volume with every node set to `fill`.
pub fn init_stack(dims: Dims3, fill: f32) -> DensityVolume {
    DensityVolume::new_filled(dims, fill)
}

/// Carve the terrain surface into `stack`.
///
/// For each column the terrain top is
/// `starting_height + trunc(v * curve(v) * height_multiplier)`, clamped to 0,
/// where `v` is the plane sample at `(x, z)`. Nodes from the top of the stack
/// down to (not including) that height become [`SOLID_DENSITY`]; everything
/// else keeps its initial value. Returns the number of nodes written.
pub fn carve(
    plane: &ScalarField2D,
    curve: &SampledCurve,
    starting_height: usize,
    stack_height: usize,
    height_multiplier: f32,
    stack: &mut DensityVolume,
) -> usize {
    let dims = stack.dims();
    debug_assert_eq!(plane.width, dims.x);
    debug_assert_eq!(plane.height, dims.z);

    let top = stack_height.min(dims.y) as i64;
    let mut written = 0;

    for z in 0..dims.z.min(plane.height) {
        for x in 0..dims.x.min(plane.width) {
            let v = plane.get(x, z);
            // `as` saturates and maps NaN to 0
            let noise_height = (v * curve.evaluate(v) * height_multiplier) as i64;
            let end = (starting_height as i64).saturating_add(noise_height).max(0);

            for y in end.saturating_add(1)..top {
                stack.set(x, y as usize, z, SOLID_DENSITY);
                written += 1;
            }
        }
    }

    written
}

/// Copy the `chunk_y`-th `n`-thick slice out of a column stack.
///
/// y is the outermost axis of the layout, so the slice is one contiguous run.
/// The result owns its data; later writes to the stack do not show through.
pub fn slice_chunk(stack: &DensityVolume, n: usize, chunk_y: usize) -> DensityVolume {
    let dims = stack.dims();
    debug_assert_eq!(dims.x, n);
    debug_assert_eq!(dims.z, n);
    debug_assert!((chunk_y + 1) * n <= dims.y);

    let layer = dims.x * dims.z;
    let start = chunk_y * n * layer;
    let data = stack.as_slice()[start..start + n * layer].to_vec();

    DensityVolume {
        dims: Dims3::new(dims.x, n, dims.z),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Keyframe, ResponseCurve};

    fn constant_curve(value: f32) -> SampledCurve {
        let curve = ResponseCurve::new(vec![Keyframe::new(0.0, value)]).unwrap();
        SampledCurve::build(&curve, 8).unwrap()
    }

    fn column(stack: &DensityVolume, x: usize, z: usize) -> Vec<f32> {
        (0..stack.dims().y).map(|y| stack.get(x, y, z)).collect()
    }

    #[test]
    fn test_init_stack_fills_every_node() {
        let stack = init_stack(Dims3::new(3, 9, 3), AIR_DENSITY);
        assert_eq!(stack.len(), 81);
        assert!(stack.as_slice().iter().all(|&v| v == AIR_DENSITY));
    }

    #[test]
    fn test_flat_plane_fills_above_starting_height() {
        let n = 4;
        let height = 12;
        let plane = ScalarField2D::square(n);
        let mut stack = init_stack(Dims3::new(n, height, n), AIR_DENSITY);

        let written = carve(&plane, &constant_curve(1.0), 5, height, 10.0, &mut stack);

        // y in 6..12 for every column
        assert_eq!(written, 6 * n * n);
        let col = column(&stack, 2, 3);
        for (y, &v) in col.iter().enumerate() {
            let expected = if y > 5 { SOLID_DENSITY } else { AIR_DENSITY };
            assert_eq!(v, expected, "y={}", y);
        }
    }

    #[test]
    fn test_height_follows_plane_and_truncates() {
        let n = 2;
        let mut plane = ScalarField2D::square(n);
        plane.set(1, 0, 0.5);
        plane.set(0, 1, 0.29);
        let mut stack = init_stack(Dims3::new(n, 20, n), AIR_DENSITY);

        carve(&plane, &constant_curve(1.0), 4, 20, 10.0, &mut stack);

        // (1,0): 4 + 5 = 9; (0,1): 4 + trunc(2.9) = 6
        assert_eq!(stack.get(1, 9, 0), AIR_DENSITY);
        assert_eq!(stack.get(1, 10, 0), SOLID_DENSITY);
        assert_eq!(stack.get(0, 6, 1), AIR_DENSITY);
        assert_eq!(stack.get(0, 7, 1), SOLID_DENSITY);
    }

    #[test]
    fn test_negative_height_clamps_to_zero() {
        let mut plane = ScalarField2D::square(1);
        plane.set(0, 0, -1.0);
        let mut stack = init_stack(Dims3::new(1, 8, 1), AIR_DENSITY);

        carve(&plane, &constant_curve(1.0), 3, 8, 10.0, &mut stack);

        let col = column(&stack, 0, 0);
        assert_eq!(col[0], AIR_DENSITY);
        assert!(col[1..].iter().all(|&v| v == SOLID_DENSITY));
    }

    #[test]
    fn test_surface_above_stack_writes_nothing() {
        let mut plane = ScalarField2D::square(2);
        plane.set(0, 0, 1.0);
        let mut stack = init_stack(Dims3::new(2, 6, 2), AIR_DENSITY);

        carve(&plane, &constant_curve(1.0), 2, 6, 100.0, &mut stack);

        assert!(column(&stack, 0, 0).iter().all(|&v| v == AIR_DENSITY));
        // untouched neighbour at v = 0 still fills 3..6
        assert_eq!(stack.get(1, 3, 1), SOLID_DENSITY);
    }

    #[test]
    fn test_extreme_multiplier_saturates() {
        let mut plane = ScalarField2D::square(2);
        plane.set(0, 0, 1.0);
        plane.set(1, 1, -1.0);
        let mut stack = init_stack(Dims3::new(2, 6, 2), AIR_DENSITY);

        carve(&plane, &constant_curve(1.0), 2, 6, f32::MAX, &mut stack);

        // +inf height: column stays air. -inf height: clamps to 0.
        assert!(column(&stack, 0, 0).iter().all(|&v| v == AIR_DENSITY));
        let low = column(&stack, 1, 1);
        assert_eq!(low[0], AIR_DENSITY);
        assert!(low[1..].iter().all(|&v| v == SOLID_DENSITY));
        // v = 0 keeps the starting height
        assert_eq!(stack.get(1, 2, 0), AIR_DENSITY);
        assert_eq!(stack.get(1, 3, 0), SOLID_DENSITY);
    }

    #[test]
    fn test_slice_chunk_copies_layers() {
        let n = 2;
        let mut stack = init_stack(Dims3::new(n, n * 3, n), AIR_DENSITY);
        stack.set(1, 2, 0, SOLID_DENSITY);
        stack.set(0, 5, 1, SOLID_DENSITY);

        let middle = slice_chunk(&stack, n, 1);
        assert_eq!(middle.dims(), Dims3::cube(n));
        assert_eq!(middle.get(1, 0, 0), SOLID_DENSITY);
        assert_eq!(middle.as_slice().iter().filter(|&&v| v == SOLID_DENSITY).count(), 1);

        let top = slice_chunk(&stack, n, 2);
        assert_eq!(top.get(0, 1, 1), SOLID_DENSITY);
    }

    #[test]
    fn test_slice_is_independent_of_stack() {
        let mut stack = init_stack(Dims3::new(2, 4, 2), AIR_DENSITY);
        let slice = slice_chunk(&stack, 2, 0);
        stack.fill(SOLID_DENSITY);
        assert!(slice.as_slice().iter().all(|&v| v == AIR_DENSITY));
    }
}
