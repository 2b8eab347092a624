//! Row-major indexing helpers.
//! The last axis varies fastest, so for a 2D field `y` is contiguous.

use crate::util::*;

/// Number of cells covered by an exclusive extent.
pub fn cell_count<const GRID_DIMENSION: usize>(
    exclusive_bounds: &Coord<GRID_DIMENSION>,
) -> usize {
    let mut accumulator = 1;
    for d in exclusive_bounds {
        accumulator *= (*d).max(0) as usize;
    }
    accumulator
}

/// Linear distance between neighbours along each axis.
pub fn strides<const GRID_DIMENSION: usize>(
    exclusive_bounds: &Coord<GRID_DIMENSION>,
) -> [usize; GRID_DIMENSION] {
    let mut result = [1; GRID_DIMENSION];
    for d in (0..GRID_DIMENSION.saturating_sub(1)).rev() {
        result[d] = result[d + 1] * exclusive_bounds[d + 1] as usize;
    }
    result
}

pub fn coord_to_linear<const GRID_DIMENSION: usize>(
    coord: &Coord<GRID_DIMENSION>,
    exclusive_bounds: &Coord<GRID_DIMENSION>,
) -> usize {
    let strides = strides(exclusive_bounds);
    let mut accumulator = 0;
    for d in 0..GRID_DIMENSION {
        debug_assert!(coord[d] >= 0 && coord[d] < exclusive_bounds[d]);
        accumulator += coord[d] as usize * strides[d];
    }
    accumulator
}

pub fn linear_to_coord<const GRID_DIMENSION: usize>(
    linear_index: usize,
    exclusive_bounds: &Coord<GRID_DIMENSION>,
) -> Coord<GRID_DIMENSION> {
    let strides = strides(exclusive_bounds);
    let mut result = Coord::zero();
    let mut remainder = linear_index;
    for d in 0..GRID_DIMENSION {
        result[d] = (remainder / strides[d]) as i32;
        remainder %= strides[d];
    }
    result
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn cell_count_test() {
        assert_eq!(cell_count(&vector![5]), 5);
        assert_eq!(cell_count(&vector![5, 7, 9]), 5 * 7 * 9);
        assert_eq!(cell_count(&vector![5, 0]), 0);
        assert_eq!(cell_count(&vector![4, -2]), 0);
    }

    #[test]
    fn strides_test() {
        assert_eq!(strides(&vector![4, 5, 6]), [30, 6, 1]);
        assert_eq!(strides(&vector![7]), [1]);
    }

    #[test]
    fn coord_to_linear_test() {
        assert_eq!(
            coord_to_linear(&vector![5, 7, 11], &vector![20, 20, 20]),
            5 * 20 * 20 + 7 * 20 + 11
        );
        assert_eq!(coord_to_linear(&vector![5, 7], &vector![20, 20]), 5 * 20 + 7);
        assert_eq!(coord_to_linear(&vector![5], &vector![20]), 5);
    }

    #[test]
    fn linear_to_coord_test() {
        assert_eq!(linear_to_coord(67, &vector![10, 10]), vector![6, 7]);
        assert_eq!(linear_to_coord(67, &vector![100]), vector![67]);
        assert_eq!(
            linear_to_coord(0, &vector![10, 10, 8, 10]),
            vector![0, 0, 0, 0]
        );
        let bounds = vector![3, 4, 5];
        for i in 0..cell_count(&bounds) {
            assert_eq!(coord_to_linear(&linear_to_coord(i, &bounds), &bounds), i);
        }
    }
}
