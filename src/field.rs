/// A 2D grid of scalar samples, row-major (`x + width * y`).
///
/// Height planes are produced once per chunk column and never modified
/// after generation finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField2D {
    pub width: usize,
    pub height: usize,
    data: Vec<f32>,
}

impl ScalarField2D {
    pub fn new(width: usize, height: usize) -> Self {
        Self::new_with(width, height, 0.0)
    }

    pub fn new_with(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Square field of `size × size` samples.
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        x + self.width * y
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.index(x, y);
        self.data[idx] = value;
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

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, &val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Smallest and largest sample, or `None` for an empty field.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.data.is_empty() {
            return None;
        }
        let mut min_v = f32::MAX;
        let mut max_v = f32::MIN;
        for &v in &self.data {
            if v < min_v { min_v = v; }
            if v > max_v { max_v = v; }
        }
        Some((min_v, max_v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let mut field = ScalarField2D::new(3, 2);
        field.set(2, 1, 7.0);
        assert_eq!(field.index(2, 1), 5);
        assert_eq!(field.as_slice()[5], 7.0);
        assert_eq!(field.get(2, 1), 7.0);
    }

    #[test]
    fn test_iter_reports_coordinates() {
        let mut field = ScalarField2D::square(2);
        field.set(1, 0, 1.0);
        field.set(0, 1, 2.0);
        let cells: Vec<_> = field.iter().collect();
        assert_eq!(cells, vec![(0, 0, 0.0), (1, 0, 1.0), (0, 1, 2.0), (1, 1, 0.0)]);
    }

    #[test]
    fn test_min_max() {
        let mut field = ScalarField2D::new_with(4, 4, 0.5);
        field.set(3, 3, -2.0);
        field.set(0, 2, 9.0);
        assert_eq!(field.min_max(), Some((-2.0, 9.0)));
        assert_eq!(ScalarField2D::new(0, 0).min_max(), None);
    }
}
