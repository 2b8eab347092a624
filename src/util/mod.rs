pub use num_traits::{Num, One, Zero};

mod aabb;
pub mod indexing;
mod surface;

pub use aabb::*;
pub use surface::*;

/// Numbers that scalar field arithmetic can run on.
pub trait NumTrait: Num + Copy + Send + Sync {}
impl<T: Num + Copy + Send + Sync> NumTrait for T {}

pub type Coord<const GRID_DIMENSION: usize> =
    nalgebra::SVector<i32, { GRID_DIMENSION }>;

/// Column 0 holds the minimum corner, column 1 the maximum corner.
pub type Bounds<const GRID_DIMENSION: usize> =
    nalgebra::SMatrix<i32, { GRID_DIMENSION }, 2>;

pub use nalgebra::{matrix, vector};
