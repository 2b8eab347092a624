//! Dense blocks of values addressed by integer coordinates.
//!
//! Every field indexes its own cells from the origin: the bounding box of
//! a field with shape `n` is `[0, n - 1]` in each direction. Where the
//! field sits in the global domain is recorded separately, as `location`,
//! the global coordinate of its local origin. Two fields covering
//! overlapping parts of the domain therefore talk to each other through a
//! relative offset (see `relative_offset`), never through global
//! coordinates.
//!
//! The outer `envelope_width` layers of a field are its envelope, a halo
//! mirroring the bulk of neighbouring blocks.

mod chunk;
mod operand;

pub use chunk::*;
pub use operand::*;

use crate::util::*;
use rayon::prelude::*;

/// Anything with a local bounding box and a global location.
pub trait Block<const GRID_DIMENSION: usize> {
    fn bounding_box(&self) -> AABB<GRID_DIMENSION>;

    fn location(&self) -> Coord<GRID_DIMENSION>;

    fn envelope_width(&self) -> i32;

    /// Bounding box without the envelope.
    fn bulk(&self) -> AABB<GRID_DIMENSION> {
        self.bounding_box().enlarge(-self.envelope_width())
    }

    /// Bounding box in global coordinates.
    fn global_box(&self) -> AABB<GRID_DIMENSION> {
        self.bounding_box().shift(&self.location())
    }
}

/// Displacement turning local coordinates of `from` into local
/// coordinates of `to`.
pub fn relative_offset<const GRID_DIMENSION: usize, A, B>(
    from: &A,
    to: &B,
) -> Coord<GRID_DIMENSION>
where
    A: Block<GRID_DIMENSION> + ?Sized,
    B: Block<GRID_DIMENSION> + ?Sized,
{
    from.location() - to.location()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field<T, const GRID_DIMENSION: usize> {
    aabb: AABB<GRID_DIMENSION>,
    location: Coord<GRID_DIMENSION>,
    envelope_width: i32,
    buffer: Vec<T>,
}

pub type ScalarField<const GRID_DIMENSION: usize> = Field<f64, GRID_DIMENSION>;

pub type Tensor<const N: usize> = nalgebra::SVector<f64, N>;

pub type TensorField<const N: usize, const GRID_DIMENSION: usize> =
    Field<Tensor<N>, GRID_DIMENSION>;

impl<T: Clone + Send + Sync, const GRID_DIMENSION: usize>
    Field<T, GRID_DIMENSION>
{
    /// Field of the given shape with every cell set to `value`,
    /// located at the global origin.
    pub fn new(shape: Coord<GRID_DIMENSION>, value: T) -> Self {
        let aabb = AABB::from_shape(&shape);
        assert!(aabb.check_validity(), "invalid field shape {:?}", shape);
        Field {
            aabb,
            location: Coord::zero(),
            envelope_width: 0,
            buffer: vec![value; aabb.buffer_size()],
        }
    }

    /// Field covering the global box `global`, with an envelope of
    /// `envelope_width` cells around it.
    pub fn covering(
        global: &AABB<GRID_DIMENSION>,
        envelope_width: i32,
        value: T,
    ) -> Self {
        let with_envelope = global.enlarge(envelope_width);
        let mut result = Self::new(with_envelope.exclusive_bounds(), value);
        result.location = with_envelope.min();
        result.envelope_width = envelope_width;
        result
    }

    pub fn from_fn<F: Fn(Coord<GRID_DIMENSION>) -> T + Send + Sync>(
        shape: Coord<GRID_DIMENSION>,
        value: T,
        f: F,
    ) -> Self {
        let mut result = Self::new(shape, value);
        result.par_set_values(f, 1024);
        result
    }

    pub fn with_location(mut self, location: Coord<GRID_DIMENSION>) -> Self {
        self.location = location;
        self
    }

    pub fn with_envelope(mut self, envelope_width: i32) -> Self {
        debug_assert!(2 * envelope_width <= self.aabb.min_size_len());
        self.envelope_width = envelope_width;
        self
    }

    pub fn reset_location(&mut self, location: Coord<GRID_DIMENSION>) {
        self.location = location;
    }

    pub fn shape(&self) -> Coord<GRID_DIMENSION> {
        self.aabb.exclusive_bounds()
    }

    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [T] {
        &mut self.buffer
    }

    #[track_caller]
    #[inline]
    pub fn get(&self, coord: &Coord<GRID_DIMENSION>) -> &T {
        debug_assert!(
            self.aabb.contains(coord),
            "{:?} does not contain {:?}",
            self.aabb,
            coord
        );
        &self.buffer[self.aabb.coord_to_linear(coord)]
    }

    #[track_caller]
    #[inline]
    pub fn get_mut(&mut self, coord: &Coord<GRID_DIMENSION>) -> &mut T {
        debug_assert!(
            self.aabb.contains(coord),
            "{:?} does not contain {:?}",
            self.aabb,
            coord
        );
        let index = self.aabb.coord_to_linear(coord);
        &mut self.buffer[index]
    }

    #[track_caller]
    #[inline]
    pub fn set(&mut self, coord: &Coord<GRID_DIMENSION>, value: T) {
        *self.get_mut(coord) = value;
    }

    /// Global coordinate of a local one.
    pub fn to_global(
        &self,
        coord: &Coord<GRID_DIMENSION>,
    ) -> Coord<GRID_DIMENSION> {
        coord + self.location
    }

    /// Local coordinate of a global one.
    pub fn to_local(
        &self,
        coord: &Coord<GRID_DIMENSION>,
    ) -> Coord<GRID_DIMENSION> {
        coord - self.location
    }

    pub fn par_modify_access(
        &mut self,
        chunk_size: usize,
    ) -> impl IndexedParallelIterator<Item = FieldChunk<'_, T, GRID_DIMENSION>>
    {
        let aabb = &self.aabb;
        self.buffer
            .par_chunks_mut(chunk_size)
            .enumerate()
            .map(move |(i, buffer_chunk): (usize, &mut [T])| {
                FieldChunk::new(i * chunk_size, aabb, buffer_chunk)
            })
    }

    /// Set every cell from its local coordinate.
    pub fn par_set_values<F: Fn(Coord<GRID_DIMENSION>) -> T + Send + Sync>(
        &mut self,
        f: F,
        chunk_size: usize,
    ) {
        self.par_modify_access(chunk_size).for_each(
            |mut d: FieldChunk<'_, T, GRID_DIMENSION>| {
                d.coord_iter_mut().for_each(|(coord, value_mut)| {
                    *value_mut = f(coord);
                })
            },
        );
    }

    pub fn par_for_each_mut<F: Fn(Coord<GRID_DIMENSION>, &mut T) + Send + Sync>(
        &mut self,
        f: F,
        chunk_size: usize,
    ) {
        self.par_modify_access(chunk_size).for_each(
            |mut d: FieldChunk<'_, T, GRID_DIMENSION>| {
                d.coord_iter_mut()
                    .for_each(|(coord, value_mut)| f(coord, value_mut))
            },
        );
    }

    /// Copy the overlapping part of `other` into self.
    pub fn copy_overlap_from(&mut self, other: &Field<T, GRID_DIMENSION>) {
        let offset = relative_offset(other, &*self);
        let other_box = other.bounding_box().shift(&offset);
        if let Some(overlap) = other_box.intersection(&self.aabb) {
            for c in overlap.coord_iter() {
                let v = other.get(&(c - offset)).clone();
                self.set(&c, v);
            }
        }
    }
}

impl<T, const GRID_DIMENSION: usize> Block<GRID_DIMENSION>
    for Field<T, GRID_DIMENSION>
{
    fn bounding_box(&self) -> AABB<GRID_DIMENSION> {
        self.aabb
    }

    fn location(&self) -> Coord<GRID_DIMENSION> {
        self.location
    }

    fn envelope_width(&self) -> i32 {
        self.envelope_width
    }
}

impl<const N: usize, const GRID_DIMENSION: usize> TensorField<N, GRID_DIMENSION> {
    /// All tensor entries as one flat slice, `N` per cell.
    pub fn components(&self) -> &[f64] {
        bytemuck::cast_slice(self.buffer())
    }

    pub fn components_mut(&mut self) -> &mut [f64] {
        bytemuck::cast_slice_mut(self.buffer_mut())
    }
}
