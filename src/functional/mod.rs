//! Processing functionals: operators executed over a box of one or more
//! fields.
//!
//! The traits differ by operand arity (one field, two fields of possibly
//! different cell types, a list of same-typed fields) and by whether the
//! functional wants the box split into bulk, faces, edges and corners
//! (`Bounded*`). A functional that accumulates statistics additionally
//! implements `Reductive`.
//!
//! Each functional declares which operands it writes. The dispatcher in
//! `apply` uses that declaration to decide how to borrow each field and to
//! report which fields need their envelopes refreshed.

mod apply;
mod generator;

pub use apply::*;
pub use generator::*;

use crate::field::*;
use crate::statistics::*;
use crate::util::*;

/// Part of the operands a functional is executed on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppliesTo {
    /// Only the bulk; envelopes are brought up to date by communication.
    Bulk,
    /// Only the envelope.
    Envelope,
    BulkAndEnvelope,
}

pub trait Functional: Send {
    /// `true` if operand number `operand` is written.
    fn modifies(&self, operand: usize) -> bool;

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::Bulk
    }

    fn modification_pattern(&self, num_operands: usize) -> Vec<bool> {
        (0..num_operands).map(|i| self.modifies(i)).collect()
    }
}

/// Functionals owning a statistics registry, read back after execution.
pub trait Reductive {
    fn statistics(&self) -> &StatisticsRegistry;

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry;
}

pub trait BoxFunctional<T, const GRID_DIMENSION: usize>: Functional {
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    );
}

pub trait BoxFunctional2<T, U, const GRID_DIMENSION: usize>: Functional {
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        a: &mut Operand<'_, T, GRID_DIMENSION>,
        b: &mut Operand<'_, U, GRID_DIMENSION>,
    );
}

pub trait BoxFunctionalN<T, const GRID_DIMENSION: usize>: Functional {
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        fields: &mut [Operand<'_, T, GRID_DIMENSION>],
    );
}

/// Boundary-aware single-operand functional. Cells outside the reference
/// block, envelope cells for instance, go to the hook of the face, edge or
/// corner they lie beyond.
///
/// `process_edge` only happens on 3D blocks and by default takes the
/// corner path, with a normal that is zero along the edge.
pub trait BoundedFunctional<T, const GRID_DIMENSION: usize>: Functional {
    fn boundary_width(&self) -> i32 {
        1
    }

    fn process_bulk(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    );

    fn process_face(
        &mut self,
        direction: usize,
        orientation: Orientation,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    );

    fn process_edge(
        &mut self,
        _plane: usize,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        self.process_corner(normal, domain, field);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    );
}

pub trait BoundedFunctional2<T, U, const GRID_DIMENSION: usize>:
    Functional
{
    fn boundary_width(&self) -> i32 {
        1
    }

    fn process_bulk(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        a: &mut Operand<'_, T, GRID_DIMENSION>,
        b: &mut Operand<'_, U, GRID_DIMENSION>,
    );

    fn process_face(
        &mut self,
        direction: usize,
        orientation: Orientation,
        domain: &AABB<GRID_DIMENSION>,
        a: &mut Operand<'_, T, GRID_DIMENSION>,
        b: &mut Operand<'_, U, GRID_DIMENSION>,
    );

    fn process_edge(
        &mut self,
        _plane: usize,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        a: &mut Operand<'_, T, GRID_DIMENSION>,
        b: &mut Operand<'_, U, GRID_DIMENSION>,
    ) {
        self.process_corner(normal, domain, a, b);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        a: &mut Operand<'_, T, GRID_DIMENSION>,
        b: &mut Operand<'_, U, GRID_DIMENSION>,
    );
}

pub trait BoundedFunctionalN<T, const GRID_DIMENSION: usize>: Functional {
    fn boundary_width(&self) -> i32 {
        1
    }

    fn process_bulk(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        fields: &mut [Operand<'_, T, GRID_DIMENSION>],
    );

    fn process_face(
        &mut self,
        direction: usize,
        orientation: Orientation,
        domain: &AABB<GRID_DIMENSION>,
        fields: &mut [Operand<'_, T, GRID_DIMENSION>],
    );

    fn process_edge(
        &mut self,
        _plane: usize,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        fields: &mut [Operand<'_, T, GRID_DIMENSION>],
    ) {
        self.process_corner(normal, domain, fields);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        fields: &mut [Operand<'_, T, GRID_DIMENSION>],
    );
}
