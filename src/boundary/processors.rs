//! Completion processors: run after envelope communication and fill the
//! imposed values of boundary cells from their inward neighbours.

use super::*;

fn inward_neighbour<const GRID_DIMENSION: usize>(
    coord: &Coord<GRID_DIMENSION>,
    normal: &Coord<GRID_DIMENSION>,
) -> Coord<GRID_DIMENSION> {
    coord - normal
}

fn face_normal<const GRID_DIMENSION: usize>(
    direction: usize,
    orientation: Orientation,
) -> Coord<GRID_DIMENSION> {
    let mut n = Coord::zero();
    n[direction] = orientation.sign();
    n
}

/// Which part of the neighbour's velocity a boundary cell takes over.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VelocityCopy {
    Full,
    /// Full velocity, with inflow through the boundary cut to zero.
    Outflow,
    NormalOnly,
    TangentialOnly,
}

impl VelocityCopy {
    fn transform<const GRID_DIMENSION: usize>(
        self,
        mut u: Tensor<GRID_DIMENSION>,
        direction: usize,
        orientation: Orientation,
    ) -> Tensor<GRID_DIMENSION> {
        match self {
            VelocityCopy::Full => u,
            VelocityCopy::Outflow => {
                if orientation.sign() as f64 * u[direction] < 0.0 {
                    u[direction] = 0.0;
                }
                u
            }
            VelocityCopy::NormalOnly => {
                let normal = u[direction];
                let mut result = Tensor::zeros();
                result[direction] = normal;
                result
            }
            VelocityCopy::TangentialOnly => {
                u[direction] = 0.0;
                u
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct VelocityCompletion {
    pub direction: usize,
    pub orientation: Orientation,
    pub copy: VelocityCopy,
}

impl Functional for VelocityCompletion {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    BoxFunctional<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>
    for VelocityCompletion
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        cells: &mut Operand<'_, Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>,
    ) {
        let normal = face_normal(self.direction, self.orientation);
        for c in domain.coord_iter() {
            let u = cells.get(&inward_neighbour(&c, &normal)).velocity();
            cells.get_mut(&c).imposed_velocity =
                self.copy.transform(u, self.direction, self.orientation);
        }
    }
}

#[derive(Debug, Clone)]
pub struct DensityCompletion {
    pub direction: usize,
    pub orientation: Orientation,
}

impl Functional for DensityCompletion {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    BoxFunctional<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>
    for DensityCompletion
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        cells: &mut Operand<'_, Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>,
    ) {
        let normal = face_normal(self.direction, self.orientation);
        for c in domain.coord_iter() {
            let rho = cells.get(&inward_neighbour(&c, &normal)).density();
            cells.get_mut(&c).imposed_density = rho;
        }
    }
}

/// Rebuilds a convex corner (or a 3D edge) cell from its neighbours: the
/// density is the average over the cells one step inward along each
/// axis of the normal, the off-equilibrium part is taken from the
/// diagonal neighbour.
#[derive(Debug, Clone)]
pub struct ExternalCornerCompletion<const GRID_DIMENSION: usize> {
    pub normal: Coord<GRID_DIMENSION>,
    /// Take the velocity from the diagonal neighbour instead of keeping
    /// the imposed one.
    pub copy_velocity: bool,
}

impl<const GRID_DIMENSION: usize> Functional
    for ExternalCornerCompletion<GRID_DIMENSION>
{
    fn modifies(&self, _operand: usize) -> bool {
        true
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    BoxFunctional<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>
    for ExternalCornerCompletion<GRID_DIMENSION>
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        cells: &mut Operand<'_, Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>,
    ) {
        assert_corner_normal(&self.normal);
        let axes: Vec<usize> =
            (0..GRID_DIMENSION).filter(|d| self.normal[*d] != 0).collect();
        for c in domain.coord_iter() {
            let rho = axes
                .iter()
                .map(|d| {
                    let mut nb = c;
                    nb[*d] -= self.normal[*d];
                    cells.get(&nb).density()
                })
                .sum::<f64>()
                / axes.len() as f64;
            let diagonal = cells.get(&inward_neighbour(&c, &self.normal));
            let descriptor = diagonal.descriptor();
            let rho_nb = diagonal.density();
            let u_nb = diagonal.velocity();
            let f_neq: [f64; Q] = std::array::from_fn(|i| {
                diagonal.f[i] - descriptor.equilibrium(i, rho_nb, &u_nb)
            });

            let cell = cells.get_mut(&c);
            if self.copy_velocity {
                cell.imposed_velocity = u_nb;
            }
            let u = cell.imposed_velocity;
            for (i, f) in cell.f.iter_mut().enumerate() {
                *f = descriptor.equilibrium(i, rho, &u) + f_neq[i];
            }
            cell.imposed_density = rho;
        }
    }
}

/// Imposes a velocity on boundary cells.
#[derive(Debug, Clone)]
pub struct ImposeVelocity<const GRID_DIMENSION: usize> {
    pub velocity: Tensor<GRID_DIMENSION>,
}

impl<const GRID_DIMENSION: usize> Functional for ImposeVelocity<GRID_DIMENSION> {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    BoxFunctional<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>
    for ImposeVelocity<GRID_DIMENSION>
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        cells: &mut Operand<'_, Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            cells.get_mut(&c).imposed_velocity = self.velocity;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImposeDensity {
    pub density: f64,
}

impl Functional for ImposeDensity {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    BoxFunctional<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION> for ImposeDensity
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        cells: &mut Operand<'_, Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            cells.get_mut(&c).imposed_density = self.density;
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::lattice::*;
    use float_cmp::assert_approx_eq;
    use std::sync::Arc;

    fn lattice() -> BlockLattice<2, 9> {
        let mut lattice =
            BlockLattice::<2, 9>::new(vector![4, 4], Arc::new(BgkDynamics::new(&D2Q9, 1.0)));
        for c in lattice.bounding_box().coord_iter() {
            let u = Tensor::<2>::new(0.01 * c[1] as f64, -0.02);
            lattice.get_mut(&c).define_equilibrium(1.0 + 0.01 * c[0] as f64, &u);
        }
        lattice
    }

    #[test]
    fn velocity_copy_test() {
        let mut lattice = lattice();
        let top = AABB::new(matrix![3, 3; 0, 3]);
        apply(
            VelocityCompletion {
                direction: 0,
                orientation: Orientation::Positive,
                copy: VelocityCopy::TangentialOnly,
            },
            top,
            lattice.cells_mut(),
        );
        let u = lattice.get(&vector![3, 2]).imposed_velocity;
        assert_eq!(u[0], 0.0);
        assert_approx_eq!(f64, u[1], -0.02, epsilon = 1e-12);
    }

    #[test]
    fn outflow_copy_test() {
        let u = Tensor::<2>::new(-0.1, 0.3);
        let v = VelocityCopy::Outflow.transform(u, 0, Orientation::Positive);
        assert_eq!(v, Tensor::<2>::new(0.0, 0.3));
        let w = VelocityCopy::Outflow.transform(u, 0, Orientation::Negative);
        assert_eq!(w, u);
        let n = VelocityCopy::NormalOnly.transform(u, 1, Orientation::Negative);
        assert_eq!(n, Tensor::<2>::new(0.0, 0.3));
    }

    #[test]
    fn density_copy_test() {
        let mut lattice = lattice();
        apply(
            DensityCompletion {
                direction: 0,
                orientation: Orientation::Negative,
            },
            AABB::new(matrix![0, 0; 0, 3]),
            lattice.cells_mut(),
        );
        assert_approx_eq!(f64, lattice.get(&vector![0, 1]).imposed_density, 1.01, epsilon = 1e-12);
    }

    #[test]
    fn external_corner_test() {
        let mut lattice = lattice();
        apply(
            ImposeVelocity {
                velocity: Tensor::<2>::new(0.05, 0.0),
            },
            AABB::new(matrix![0, 0; 0, 0]),
            lattice.cells_mut(),
        );
        apply(
            ExternalCornerCompletion {
                normal: vector![-1, -1],
                copy_velocity: false,
            },
            AABB::new(matrix![0, 0; 0, 0]),
            lattice.cells_mut(),
        );
        let corner = lattice.get(&vector![0, 0]);
        // Neighbours (1, 0) and (0, 1) have densities 1.01 and 1.0;
        // the diagonal neighbour sits at equilibrium.
        assert_approx_eq!(f64, corner.raw_density(), 1.005, epsilon = 1e-12);
        assert_approx_eq!(f64, corner.raw_velocity()[0], 0.05, epsilon = 1e-12);
    }
}
