use crate::util::indexing::*;
use crate::util::*;

/// Axis Aligned Bounding Box (AABB) for integer coordinates.
/// Each instance is inclusive of both corners.
/// Blocks, fields and functional domains are all described by one,
/// and it is responsible for mapping between a linear buffer
/// and coordinates.
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct AABB<const DIMENSION: usize> {
    pub bounds: Bounds<DIMENSION>,
}

impl<const GRID_DIMENSION: usize> std::fmt::Display for AABB<GRID_DIMENSION> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> Result<(), std::fmt::Error> {
        write!(f, "[")?;
        for d in 0..GRID_DIMENSION {
            if d > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}..={}", self.bounds[(d, 0)], self.bounds[(d, 1)])?;
        }
        write!(f, "]")
    }
}

impl<const DIMENSION: usize> AABB<DIMENSION> {
    /// Create AABB from raw bounds.
    #[inline]
    pub fn new(bounds: Bounds<DIMENSION>) -> Self {
        AABB { bounds }
    }

    /// Create AABB from corners.
    pub fn from_mm(min: Coord<DIMENSION>, max: Coord<DIMENSION>) -> Self {
        AABB {
            bounds: Bounds::from_columns(&[min, max]),
        }
    }

    /// Box `[0, shape - 1]` in each direction.
    pub fn from_shape(shape: &Coord<DIMENSION>) -> Self {
        Self::from_mm(Coord::zero(), shape.add_scalar(-1))
    }

    /// Moving min to the origin, returns the exclusive size in each direction
    /// i.e. [0, 9]  would have exclusive size of 10.
    pub fn exclusive_bounds(&self) -> Coord<DIMENSION> {
        (self.bounds.column(1) - self.bounds.column(0)).add_scalar(1)
    }

    /// Return the number of coordinates contained in the instance.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        cell_count(&self.exclusive_bounds())
    }

    /// Return the linear index for a coord in the instance
    pub fn coord_to_linear(&self, coord: &Coord<DIMENSION>) -> usize {
        coord_to_linear(&(coord - self.min()), &self.exclusive_bounds())
    }

    /// Return the coordinate in the instance for a given linear index.
    pub fn linear_to_coord(&self, index: usize) -> Coord<DIMENSION> {
        linear_to_coord(index, &self.exclusive_bounds()) + self.min()
    }

    /// Check whether the instance contains a coordinate.
    pub fn contains(&self, coord: &Coord<DIMENSION>) -> bool {
        for d in 0..DIMENSION {
            if coord[d] < self.bounds[(d, 0)] || coord[d] > self.bounds[(d, 1)]
            {
                return false;
            }
        }
        true
    }

    /// Check whether another AABB is contained in the instance.
    pub fn contains_aabb(&self, other: &Self) -> bool {
        for d in 0..DIMENSION {
            if other.bounds[(d, 0)] < self.bounds[(d, 0)]
                || other.bounds[(d, 1)] > self.bounds[(d, 1)]
            {
                return false;
            }
        }
        true
    }

    /// Common sub-box of two boxes, `None` when they do not overlap.
    /// Callers treat `None` as a silent no-op.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let mut result = *self;
        for d in 0..DIMENSION {
            result.bounds[(d, 0)] =
                self.bounds[(d, 0)].max(other.bounds[(d, 0)]);
            result.bounds[(d, 1)] =
                self.bounds[(d, 1)].min(other.bounds[(d, 1)]);
        }
        if result.check_validity() {
            Some(result)
        } else {
            None
        }
    }

    /// Translate by `offset`.
    pub fn shift(&self, offset: &Coord<DIMENSION>) -> Self {
        Self::from_mm(self.min() + offset, self.max() + offset)
    }

    /// Grow (or shrink, for negative widths) by `width` on every side.
    pub fn enlarge(&self, width: i32) -> Self {
        Self::from_mm(self.min().add_scalar(-width), self.max().add_scalar(width))
    }

    /// Return min corner.
    pub fn min(&self) -> Coord<DIMENSION> {
        self.bounds.column(0).into()
    }

    /// Return max corner
    pub fn max(&self) -> Coord<DIMENSION> {
        self.bounds.column(1).into()
    }

    /// Check that max >= min
    pub fn check_validity(&self) -> bool {
        for d in 0..DIMENSION {
            if self.bounds[(d, 0)] > self.bounds[(d, 1)] {
                return false;
            }
        }
        true
    }

    /// Number of axes along which the box is a single cell thick.
    pub fn degenerate_axes(&self) -> usize {
        (0..DIMENSION)
            .filter(|d| self.bounds[(*d, 0)] == self.bounds[(*d, 1)])
            .count()
    }

    /// Return iterator over contained coords in linear ordering.
    pub fn coord_iter(&self) -> impl Iterator<Item = Coord<DIMENSION>> + '_ {
        (0..self.buffer_size()).map(|i| self.linear_to_coord(i))
    }

    /// Return the min of exclusive_bounds()
    pub fn min_size_len(&self) -> i32 {
        self.exclusive_bounds().min()
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn buffer_size_test() {
        {
            let a = AABB::new(matrix![0, 5]);
            assert_eq!(a.buffer_size(), 6);
        }

        {
            let dimensions = AABB::new(matrix![0, 5; 0, 7; 0, 9]);
            assert_eq!(dimensions.buffer_size(), 6 * 8 * 10);
        }

        {
            let dimensions = AABB::new(matrix![1, 6; 1, 8; 1, 10]);
            assert_eq!(dimensions.buffer_size(), 6 * 8 * 10);
        }
    }

    #[test]
    fn linear_to_coord_test() {
        {
            let bb = AABB::new(matrix![2, 8]);
            assert_eq!(bb.linear_to_coord(5), vector![7]);
        }

        {
            let bound = AABB::new(matrix![3, 9; -2, 8]);
            let c = vector![9, 8];
            let li = bound.coord_to_linear(&c);
            assert_eq!(li, bound.buffer_size() - 1);
            assert_eq!(c, bound.linear_to_coord(li));
        }
    }

    #[test]
    fn from_shape_test() {
        let a = AABB::from_shape(&vector![4, 6]);
        assert_eq!(a, AABB::new(matrix![0, 3; 0, 5]));
        assert_eq!(a.buffer_size(), 24);
    }

    #[test]
    fn check_validity_test() {
        assert!(AABB::new(matrix![0, 9]).check_validity());
        assert!(!AABB::new(matrix![9, 0]).check_validity());
        assert!(AABB::new(matrix![0, 0]).check_validity());
    }

    #[test]
    fn intersection_test() {
        {
            let a = AABB::new(matrix![0, 9; 0, 9]);
            let b = AABB::new(matrix![5, 14; -3, 2]);
            let c = a.intersection(&b).unwrap();
            assert_eq!(c, AABB::new(matrix![5, 9; 0, 2]));
            assert_eq!(b.intersection(&a), Some(c));
            assert!(a.contains_aabb(&c));
            assert!(b.contains_aabb(&c));
        }

        {
            let a = AABB::new(matrix![0, 4; 0, 4]);
            let b = AABB::new(matrix![5, 9; 0, 4]);
            assert_eq!(a.intersection(&b), None);
            assert_eq!(b.intersection(&a), None);
        }

        {
            let a = AABB::new(matrix![0, 4; 0, 4; 0, 4]);
            let b = AABB::new(matrix![4, 9; 4, 9; 4, 9]);
            assert_eq!(
                a.intersection(&b),
                Some(AABB::new(matrix![4, 4; 4, 4; 4, 4]))
            );
        }
    }

    #[test]
    fn shift_enlarge_test() {
        let a = AABB::new(matrix![1, 3; 2, 5]);
        assert_eq!(a.shift(&vector![-1, 2]), AABB::new(matrix![0, 2; 4, 7]));
        assert_eq!(a.enlarge(1), AABB::new(matrix![0, 4; 1, 6]));
        assert_eq!(a.enlarge(1).enlarge(-1), a);
    }

    #[test]
    fn degenerate_axes_test() {
        assert_eq!(AABB::new(matrix![0, 0; 0, 4]).degenerate_axes(), 1);
        assert_eq!(AABB::new(matrix![0, 0; 4, 4]).degenerate_axes(), 2);
        assert_eq!(AABB::new(matrix![0, 3; 0, 4]).degenerate_axes(), 0);
    }

    #[test]
    fn min_size_len() {
        assert_eq!(AABB::new(matrix![0, 5]).min_size_len(), 6);
        assert_eq!(AABB::new(matrix![0, 5; 1, 3]).min_size_len(), 3);
    }
}
