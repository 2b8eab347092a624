//! Views of fields as handed to a functional.
//!
//! A functional works in the coordinates of the first operand of a call.
//! Each operand carries the shift from those coordinates into its own
//! index space; the dispatcher computes it once and every access goes
//! through it, so functionals never translate coordinates themselves.

use super::*;

/// A field passed to the dispatcher, either shared or exclusive.
pub enum FieldRef<'a, T, const GRID_DIMENSION: usize> {
    Shared(&'a Field<T, GRID_DIMENSION>),
    Exclusive(&'a mut Field<T, GRID_DIMENSION>),
}

impl<'a, T, const GRID_DIMENSION: usize> From<&'a Field<T, GRID_DIMENSION>>
    for FieldRef<'a, T, GRID_DIMENSION>
{
    fn from(field: &'a Field<T, GRID_DIMENSION>) -> Self {
        FieldRef::Shared(field)
    }
}

impl<'a, T, const GRID_DIMENSION: usize> From<&'a mut Field<T, GRID_DIMENSION>>
    for FieldRef<'a, T, GRID_DIMENSION>
{
    fn from(field: &'a mut Field<T, GRID_DIMENSION>) -> Self {
        FieldRef::Exclusive(field)
    }
}

impl<T, const GRID_DIMENSION: usize> FieldRef<'_, T, GRID_DIMENSION> {
    pub fn field(&self) -> &Field<T, GRID_DIMENSION> {
        match self {
            FieldRef::Shared(f) => f,
            FieldRef::Exclusive(f) => f,
        }
    }
}

enum Access<'a, T, const GRID_DIMENSION: usize> {
    Read(&'a Field<T, GRID_DIMENSION>),
    Write(&'a mut Field<T, GRID_DIMENSION>),
}

pub struct Operand<'a, T, const GRID_DIMENSION: usize> {
    access: Access<'a, T, GRID_DIMENSION>,
    shift: Coord<GRID_DIMENSION>,
    index: usize,
}

impl<'a, T: Clone + Send + Sync, const GRID_DIMENSION: usize>
    Operand<'a, T, GRID_DIMENSION>
{
    pub fn read(
        field: &'a Field<T, GRID_DIMENSION>,
        shift: Coord<GRID_DIMENSION>,
    ) -> Self {
        Operand {
            access: Access::Read(field),
            shift,
            index: 0,
        }
    }

    pub fn write(
        field: &'a mut Field<T, GRID_DIMENSION>,
        shift: Coord<GRID_DIMENSION>,
    ) -> Self {
        Operand {
            access: Access::Write(field),
            shift,
            index: 0,
        }
    }

    /// Operand number `index` of a call. Writable only when the
    /// functional declared it modified; asking to write a field passed
    /// by shared reference is a programming error.
    #[track_caller]
    pub fn from_ref(
        field: FieldRef<'a, T, GRID_DIMENSION>,
        index: usize,
        modified: bool,
        shift: Coord<GRID_DIMENSION>,
    ) -> Self {
        let access = match (field, modified) {
            (FieldRef::Exclusive(f), true) => Access::Write(f),
            (FieldRef::Exclusive(f), false) => Access::Read(&*f),
            (FieldRef::Shared(f), false) => Access::Read(f),
            (FieldRef::Shared(_), true) => panic!(
                "operand {} is modified by the functional \
                 but was passed by shared reference",
                index
            ),
        };
        Operand {
            access,
            shift,
            index,
        }
    }

    pub fn field(&self) -> &Field<T, GRID_DIMENSION> {
        match &self.access {
            Access::Read(f) => f,
            Access::Write(f) => f,
        }
    }

    pub fn shift(&self) -> Coord<GRID_DIMENSION> {
        self.shift
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.access, Access::Write(_))
    }

    /// Bounding box expressed in the caller's coordinates.
    pub fn bounding_box(&self) -> AABB<GRID_DIMENSION> {
        self.field().bounding_box().shift(&-self.shift)
    }

    /// Bulk expressed in the caller's coordinates.
    pub fn bulk(&self) -> AABB<GRID_DIMENSION> {
        self.field().bulk().shift(&-self.shift)
    }

    pub fn contains(&self, coord: &Coord<GRID_DIMENSION>) -> bool {
        self.field().bounding_box().contains(&(coord + self.shift))
    }

    /// Global coordinate of a coordinate given in the caller's frame.
    pub fn to_global(
        &self,
        coord: &Coord<GRID_DIMENSION>,
    ) -> Coord<GRID_DIMENSION> {
        self.field().to_global(&(coord + self.shift))
    }

    #[track_caller]
    #[inline]
    pub fn get(&self, coord: &Coord<GRID_DIMENSION>) -> &T {
        let local = coord + self.shift;
        match &self.access {
            Access::Read(f) => f.get(&local),
            Access::Write(f) => f.get(&local),
        }
    }

    #[track_caller]
    #[inline]
    pub fn get_mut(&mut self, coord: &Coord<GRID_DIMENSION>) -> &mut T {
        let local = coord + self.shift;
        match &mut self.access {
            Access::Write(f) => f.get_mut(&local),
            Access::Read(_) => panic!(
                "operand {} is not declared as modified by the functional",
                self.index
            ),
        }
    }

    #[track_caller]
    #[inline]
    pub fn set(&mut self, coord: &Coord<GRID_DIMENSION>, value: T) {
        *self.get_mut(coord) = value;
    }
}
