//! Finite-difference derivatives of velocity fields.
//!
//! Inside the block central differences are used. On the outer layer the
//! difference along the boundary normal becomes one-sided, pointing into
//! the block.

use super::*;
use crate::lattice::Matrix;

/// `d u[component] / d x[axis]` at `coord`. `side` is the normal
/// component along `axis`: 0 for a central difference, +1 or -1 for a
/// one-sided difference at the positive or negative end. A field one
/// cell thick along `axis` has no difference there and yields 0.
fn partial<const N: usize, const GRID_DIMENSION: usize>(
    u: &Operand<'_, Tensor<N>, GRID_DIMENSION>,
    coord: &Coord<GRID_DIMENSION>,
    component: usize,
    axis: usize,
    side: i32,
) -> f64 {
    let mut plus = *coord;
    let mut minus = *coord;
    plus[axis] += 1;
    minus[axis] -= 1;
    let forward = side <= 0 && u.contains(&plus);
    let backward = side >= 0 && u.contains(&minus);
    let at = |c: &Coord<GRID_DIMENSION>| u.get(c)[component];
    match (backward, forward) {
        (true, true) => 0.5 * (at(&plus) - at(&minus)),
        (true, false) => at(coord) - at(&minus),
        (false, true) => at(&plus) - at(coord),
        (false, false) => 0.0,
    }
}

fn gradient<const GRID_DIMENSION: usize>(
    u: &Operand<'_, Tensor<GRID_DIMENSION>, GRID_DIMENSION>,
    coord: &Coord<GRID_DIMENSION>,
    normal: &Coord<GRID_DIMENSION>,
) -> Matrix<GRID_DIMENSION> {
    Matrix::from_fn(|component, axis| {
        partial(u, coord, component, axis, normal[axis])
    })
}

/// `(du_y / dx - du_x / dy)` of a 2D velocity field.
#[derive(Debug, Clone)]
pub struct Vorticity2D;

impl Vorticity2D {
    fn compute(
        u: &Operand<'_, Tensor<2>, 2>,
        omega: &mut Operand<'_, f64, 2>,
        domain: &AABB<2>,
        normal: &Coord<2>,
    ) {
        for c in domain.coord_iter() {
            let value = partial(u, &c, 1, 0, normal[0])
                - partial(u, &c, 0, 1, normal[1]);
            omega.set(&c, value);
        }
    }
}

impl Functional for Vorticity2D {
    fn modifies(&self, operand: usize) -> bool {
        operand == 1
    }
}

impl BoundedFunctional2<Tensor<2>, f64, 2> for Vorticity2D {
    fn process_bulk(
        &mut self,
        domain: &AABB<2>,
        u: &mut Operand<'_, Tensor<2>, 2>,
        omega: &mut Operand<'_, f64, 2>,
    ) {
        Self::compute(u, omega, domain, &Coord::zero());
    }

    fn process_face(
        &mut self,
        direction: usize,
        orientation: Orientation,
        domain: &AABB<2>,
        u: &mut Operand<'_, Tensor<2>, 2>,
        omega: &mut Operand<'_, f64, 2>,
    ) {
        let normal = Region::Face {
            direction,
            orientation,
        }
        .normal();
        Self::compute(u, omega, domain, &normal);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<2>,
        domain: &AABB<2>,
        u: &mut Operand<'_, Tensor<2>, 2>,
        omega: &mut Operand<'_, f64, 2>,
    ) {
        Self::compute(u, omega, domain, normal);
    }
}

/// Symmetric part of the velocity gradient.
#[derive(Debug, Clone)]
pub struct StrainRate;

impl StrainRate {
    fn compute<const GRID_DIMENSION: usize>(
        u: &Operand<'_, Tensor<GRID_DIMENSION>, GRID_DIMENSION>,
        s: &mut Operand<'_, Matrix<GRID_DIMENSION>, GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        normal: &Coord<GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            let g = gradient(u, &c, normal);
            s.set(&c, (g + g.transpose()) * 0.5);
        }
    }
}

impl Functional for StrainRate {
    fn modifies(&self, operand: usize) -> bool {
        operand == 1
    }
}

impl<const GRID_DIMENSION: usize>
    BoundedFunctional2<Tensor<GRID_DIMENSION>, Matrix<GRID_DIMENSION>, GRID_DIMENSION>
    for StrainRate
{
    fn process_bulk(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        u: &mut Operand<'_, Tensor<GRID_DIMENSION>, GRID_DIMENSION>,
        s: &mut Operand<'_, Matrix<GRID_DIMENSION>, GRID_DIMENSION>,
    ) {
        Self::compute(u, s, domain, &Coord::zero());
    }

    fn process_face(
        &mut self,
        direction: usize,
        orientation: Orientation,
        domain: &AABB<GRID_DIMENSION>,
        u: &mut Operand<'_, Tensor<GRID_DIMENSION>, GRID_DIMENSION>,
        s: &mut Operand<'_, Matrix<GRID_DIMENSION>, GRID_DIMENSION>,
    ) {
        let normal = Region::<GRID_DIMENSION>::Face {
            direction,
            orientation,
        }
        .normal();
        Self::compute(u, s, domain, &normal);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        u: &mut Operand<'_, Tensor<GRID_DIMENSION>, GRID_DIMENSION>,
        s: &mut Operand<'_, Matrix<GRID_DIMENSION>, GRID_DIMENSION>,
    ) {
        Self::compute(u, s, domain, normal);
    }
}

pub fn compute_vorticity(velocity: &TensorField<2, 2>) -> ScalarField<2> {
    let mut result = Field::new(velocity.shape(), 0.0)
        .with_location(velocity.location())
        .with_envelope(velocity.envelope_width());
    apply_bounded2(Vorticity2D, velocity.bounding_box(), velocity, &mut result);
    result
}

pub fn compute_strain_rate<const GRID_DIMENSION: usize>(
    velocity: &TensorField<GRID_DIMENSION, GRID_DIMENSION>,
) -> MatrixField<GRID_DIMENSION> {
    let mut result = Field::new(velocity.shape(), Matrix::zeros())
        .with_location(velocity.location())
        .with_envelope(velocity.envelope_width());
    apply_bounded2(StrainRate, velocity.bounding_box(), velocity, &mut result);
    result
}
