//! Per-cell transforms: a new field computed cell by cell from another.

use super::*;
use crate::lattice::{Cell, CellField, Matrix};

/// `result[c] = transform(source[c])`
#[derive(Clone)]
pub struct CellTransform<F> {
    transform: F,
}

impl<F> CellTransform<F> {
    pub fn new(transform: F) -> Self {
        CellTransform { transform }
    }
}

impl<F: Send> Functional for CellTransform<F> {
    fn modifies(&self, operand: usize) -> bool {
        operand == 1
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<A, B, F, const GRID_DIMENSION: usize> BoxFunctional2<A, B, GRID_DIMENSION>
    for CellTransform<F>
where
    A: Clone + Send + Sync,
    B: Clone + Send + Sync,
    F: Fn(&A) -> B + Send,
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        source: &mut Operand<'_, A, GRID_DIMENSION>,
        result: &mut Operand<'_, B, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            result.set(&c, (self.transform)(source.get(&c)));
        }
    }
}

/// Field with the layout of `source`, filled with `transform` of each
/// cell.
pub fn transform_cells<A, B, F, const GRID_DIMENSION: usize>(
    source: &Field<A, GRID_DIMENSION>,
    empty: B,
    transform: F,
) -> Field<B, GRID_DIMENSION>
where
    A: Clone + Send + Sync,
    B: Clone + Send + Sync,
    F: Fn(&A) -> B + Send,
{
    let mut result = Field::new(source.shape(), empty)
        .with_location(source.location())
        .with_envelope(source.envelope_width());
    apply2(
        CellTransform::new(transform),
        source.bounding_box(),
        source,
        &mut result,
    );
    result
}

pub fn compute_norm<const N: usize, const GRID_DIMENSION: usize>(
    field: &TensorField<N, GRID_DIMENSION>,
) -> ScalarField<GRID_DIMENSION> {
    transform_cells(field, 0.0, |t: &Tensor<N>| t.norm())
}

pub fn compute_norm_sqr<const N: usize, const GRID_DIMENSION: usize>(
    field: &TensorField<N, GRID_DIMENSION>,
) -> ScalarField<GRID_DIMENSION> {
    transform_cells(field, 0.0, |t: &Tensor<N>| t.norm_squared())
}

pub fn extract_component<const N: usize, const GRID_DIMENSION: usize>(
    field: &TensorField<N, GRID_DIMENSION>,
    component: usize,
) -> ScalarField<GRID_DIMENSION> {
    assert!(component < N, "component {} of a {}-tensor", component, N);
    transform_cells(field, 0.0, move |t: &Tensor<N>| t[component])
}

pub type MatrixField<const GRID_DIMENSION: usize> =
    Field<Matrix<GRID_DIMENSION>, GRID_DIMENSION>;

pub fn compute_density<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
) -> ScalarField<GRID_DIMENSION> {
    transform_cells(cells, 0.0, |c: &Cell<GRID_DIMENSION, Q>| c.density())
}

pub fn compute_velocity<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
) -> TensorField<GRID_DIMENSION, GRID_DIMENSION> {
    transform_cells(cells, Tensor::zeros(), |c: &Cell<GRID_DIMENSION, Q>| {
        c.velocity()
    })
}

pub fn compute_velocity_norm<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
) -> ScalarField<GRID_DIMENSION> {
    transform_cells(cells, 0.0, |c: &Cell<GRID_DIMENSION, Q>| {
        c.velocity().norm()
    })
}

pub fn compute_velocity_component<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
    component: usize,
) -> ScalarField<GRID_DIMENSION> {
    assert!(component < GRID_DIMENSION);
    transform_cells(cells, 0.0, move |c: &Cell<GRID_DIMENSION, Q>| {
        c.velocity()[component]
    })
}

/// `|u|^2 / 2` per cell.
pub fn compute_kinetic_energy<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
) -> ScalarField<GRID_DIMENSION> {
    transform_cells(cells, 0.0, |c: &Cell<GRID_DIMENSION, Q>| {
        0.5 * c.velocity().norm_squared()
    })
}

pub fn compute_pi_neq<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
) -> MatrixField<GRID_DIMENSION> {
    transform_cells(cells, Matrix::zeros(), |c: &Cell<GRID_DIMENSION, Q>| {
        c.pi_neq()
    })
}

/// Deviatoric stress of BGK fluid cells, `-(1 - omega / 2) Pi_neq`, with
/// the relaxation frequency of each cell's dynamics.
pub fn compute_deviatoric_stress<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
) -> MatrixField<GRID_DIMENSION> {
    transform_cells(cells, Matrix::zeros(), |c: &Cell<GRID_DIMENSION, Q>| {
        let omega = c.dynamics().omega();
        c.pi_neq() * -(1.0 - 0.5 * omega)
    })
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::lattice::*;
    use float_cmp::assert_approx_eq;
    use std::sync::Arc;

    #[test]
    fn tensor_test() {
        let t = TensorField::<2, 2>::new(vector![4, 4], Tensor::<2>::new(3.0, 4.0));
        let n = compute_norm(&t);
        assert!(n.buffer().iter().all(|v| *v == 5.0));
        let n2 = compute_norm_sqr(&t);
        assert!(n2.buffer().iter().all(|v| *v == 25.0));
        let y = extract_component(&t, 1);
        assert!(y.buffer().iter().all(|v| *v == 4.0));
    }

    #[test]
    fn lattice_test() {
        let mut lattice =
            BlockLattice::<2, 9>::new(vector![3, 3], Arc::new(BgkDynamics::new(&D2Q9, 1.0)));
        let u = Tensor::<2>::new(0.1, 0.0);
        lattice.initialize_at_equilibrium(&lattice.bounding_box(), 1.1, &u);
        let rho = compute_density(lattice.cells());
        let energy = compute_kinetic_energy(lattice.cells());
        let ux = compute_velocity_component(lattice.cells(), 0);
        let stress = compute_deviatoric_stress(lattice.cells());
        for c in rho.bounding_box().coord_iter() {
            assert_approx_eq!(f64, *rho.get(&c), 1.1, epsilon = 1e-12);
            assert_approx_eq!(f64, *energy.get(&c), 0.005, epsilon = 1e-12);
            assert_approx_eq!(f64, *ux.get(&c), 0.1, epsilon = 1e-12);
            assert!(stress.get(&c).norm() < 1e-12);
        }
    }
}
