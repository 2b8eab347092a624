use crate::util::*;

/// A contiguous run of cells of a field, handed to one rayon task.
pub struct FieldChunk<'a, T, const GRID_DIMENSION: usize> {
    offset: usize,
    aabb: &'a AABB<GRID_DIMENSION>,
    buffer: &'a mut [T],
}

impl<'a, T, const GRID_DIMENSION: usize> FieldChunk<'a, T, GRID_DIMENSION> {
    pub fn new(
        offset: usize,
        aabb: &'a AABB<GRID_DIMENSION>,
        buffer: &'a mut [T],
    ) -> Self {
        FieldChunk {
            offset,
            aabb,
            buffer,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn coord_iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (Coord<GRID_DIMENSION>, &mut T)> {
        let offset = self.offset;
        let aabb = *self.aabb;
        self.buffer
            .iter_mut()
            .enumerate()
            .map(move |(i, v): (usize, &mut T)| {
                (aabb.linear_to_coord(offset + i), v)
            })
    }
}
