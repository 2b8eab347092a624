use super::*;
use crate::util::Orientation;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DynamicsKind {
    Bgk,
    BounceBack,
    NoDynamics,
    VelocityBoundary {
        direction: usize,
        orientation: Orientation,
    },
    DensityBoundary {
        direction: usize,
        orientation: Orientation,
    },
    Equilibrium,
}

/// Local collision operator of a cell.
pub trait Dynamics<const GRID_DIMENSION: usize, const Q: usize>:
    Send + Sync + fmt::Debug
{
    fn kind(&self) -> DynamicsKind;

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q>;

    fn collide(&self, cell: &mut Cell<GRID_DIMENSION, Q>);

    fn density(&self, cell: &Cell<GRID_DIMENSION, Q>) -> f64 {
        cell.raw_density()
    }

    fn velocity(&self, cell: &Cell<GRID_DIMENSION, Q>) -> Tensor<GRID_DIMENSION> {
        cell.raw_velocity()
    }

    /// Relaxation frequency, zero for dynamics that do not relax.
    fn omega(&self) -> f64 {
        0.0
    }
}

fn bgk_relax<const GRID_DIMENSION: usize, const Q: usize>(
    descriptor: &Descriptor<GRID_DIMENSION, Q>,
    f: &mut [f64; Q],
    rho: f64,
    u: &Tensor<GRID_DIMENSION>,
    omega: f64,
) {
    for (i, f_i) in f.iter_mut().enumerate() {
        *f_i = (1.0 - omega) * *f_i + omega * descriptor.equilibrium(i, rho, u);
    }
}

#[derive(Debug, Clone)]
pub struct BgkDynamics<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
    omega: f64,
}

impl<const GRID_DIMENSION: usize, const Q: usize> BgkDynamics<GRID_DIMENSION, Q> {
    pub fn new(descriptor: &'static Descriptor<GRID_DIMENSION, Q>, omega: f64) -> Self {
        assert!(
            omega > 0.0 && omega < 2.0,
            "relaxation frequency {} outside (0, 2)",
            omega
        );
        BgkDynamics { descriptor, omega }
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Dynamics<GRID_DIMENSION, Q>
    for BgkDynamics<GRID_DIMENSION, Q>
{
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::Bgk
    }

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.descriptor
    }

    fn collide(&self, cell: &mut Cell<GRID_DIMENSION, Q>) {
        let rho = cell.raw_density();
        let u = cell.raw_velocity();
        bgk_relax(self.descriptor, &mut cell.f, rho, &u, self.omega);
    }

    fn omega(&self) -> f64 {
        self.omega
    }
}

/// Full-way bounce-back: populations are reflected in place.
#[derive(Debug, Clone)]
pub struct BounceBack<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
    rho: f64,
}

impl<const GRID_DIMENSION: usize, const Q: usize> BounceBack<GRID_DIMENSION, Q> {
    pub fn new(descriptor: &'static Descriptor<GRID_DIMENSION, Q>) -> Self {
        BounceBack {
            descriptor,
            rho: 1.0,
        }
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Dynamics<GRID_DIMENSION, Q>
    for BounceBack<GRID_DIMENSION, Q>
{
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::BounceBack
    }

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.descriptor
    }

    fn collide(&self, cell: &mut Cell<GRID_DIMENSION, Q>) {
        for i in 0..Q {
            let o = self.descriptor.opposite(i);
            if i < o {
                cell.f.swap(i, o);
            }
        }
    }

    fn density(&self, _cell: &Cell<GRID_DIMENSION, Q>) -> f64 {
        self.rho
    }

    fn velocity(&self, _cell: &Cell<GRID_DIMENSION, Q>) -> Tensor<GRID_DIMENSION> {
        Tensor::zeros()
    }
}

#[derive(Debug, Clone)]
pub struct NoDynamics<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
}

impl<const GRID_DIMENSION: usize, const Q: usize> NoDynamics<GRID_DIMENSION, Q> {
    pub fn new(descriptor: &'static Descriptor<GRID_DIMENSION, Q>) -> Self {
        NoDynamics { descriptor }
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Dynamics<GRID_DIMENSION, Q>
    for NoDynamics<GRID_DIMENSION, Q>
{
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::NoDynamics
    }

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.descriptor
    }

    fn collide(&self, _cell: &mut Cell<GRID_DIMENSION, Q>) {}

    fn density(&self, _cell: &Cell<GRID_DIMENSION, Q>) -> f64 {
        1.0
    }

    fn velocity(&self, _cell: &Cell<GRID_DIMENSION, Q>) -> Tensor<GRID_DIMENSION> {
        Tensor::zeros()
    }
}

/// Sums of the populations of a boundary cell, split by the sign of
/// their velocity along the boundary normal: (tangential, outgoing).
fn boundary_sums<const GRID_DIMENSION: usize, const Q: usize>(
    descriptor: &Descriptor<GRID_DIMENSION, Q>,
    f: &[f64; Q],
    direction: usize,
    orientation: Orientation,
) -> (f64, f64) {
    let mut tangential = 0.0;
    let mut outgoing = 0.0;
    for (i, f_i) in f.iter().enumerate() {
        let c = descriptor.velocities[i][direction];
        if c == 0 {
            tangential += f_i;
        } else if c == orientation.sign() {
            outgoing += f_i;
        }
    }
    (tangential, outgoing)
}

/// Populations entering the domain through the boundary are unknown
/// after streaming; rebuild them from their opposite by bouncing back
/// the off-equilibrium part.
fn complete_populations<const GRID_DIMENSION: usize, const Q: usize>(
    descriptor: &Descriptor<GRID_DIMENSION, Q>,
    f: &mut [f64; Q],
    direction: usize,
    orientation: Orientation,
    rho: f64,
    u: &Tensor<GRID_DIMENSION>,
) {
    for i in 0..Q {
        if descriptor.velocities[i][direction] == -orientation.sign() {
            let o = descriptor.opposite(i);
            f[i] = descriptor.equilibrium(i, rho, u) + f[o]
                - descriptor.equilibrium(o, rho, u);
        }
    }
}

/// Dynamics of a straight boundary cell with imposed velocity; the
/// density follows from the known populations.
#[derive(Debug, Clone)]
pub struct VelocityBoundaryDynamics<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
    omega: f64,
    direction: usize,
    orientation: Orientation,
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    VelocityBoundaryDynamics<GRID_DIMENSION, Q>
{
    pub fn new(
        descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
        omega: f64,
        direction: usize,
        orientation: Orientation,
    ) -> Self {
        VelocityBoundaryDynamics {
            descriptor,
            omega,
            direction,
            orientation,
        }
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Dynamics<GRID_DIMENSION, Q>
    for VelocityBoundaryDynamics<GRID_DIMENSION, Q>
{
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::VelocityBoundary {
            direction: self.direction,
            orientation: self.orientation,
        }
    }

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.descriptor
    }

    fn collide(&self, cell: &mut Cell<GRID_DIMENSION, Q>) {
        let rho = self.density(cell);
        let u = cell.imposed_velocity;
        complete_populations(
            self.descriptor,
            &mut cell.f,
            self.direction,
            self.orientation,
            rho,
            &u,
        );
        bgk_relax(self.descriptor, &mut cell.f, rho, &u, self.omega);
    }

    fn density(&self, cell: &Cell<GRID_DIMENSION, Q>) -> f64 {
        let (tangential, outgoing) =
            boundary_sums(self.descriptor, &cell.f, self.direction, self.orientation);
        let u_normal =
            self.orientation.sign() as f64 * cell.imposed_velocity[self.direction];
        (tangential + 2.0 * outgoing) / (1.0 + u_normal)
    }

    fn velocity(&self, cell: &Cell<GRID_DIMENSION, Q>) -> Tensor<GRID_DIMENSION> {
        cell.imposed_velocity
    }

    fn omega(&self) -> f64 {
        self.omega
    }
}

/// Dynamics of a straight boundary cell with imposed density; only the
/// normal velocity component is free, tangential components are zero.
#[derive(Debug, Clone)]
pub struct DensityBoundaryDynamics<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
    omega: f64,
    direction: usize,
    orientation: Orientation,
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    DensityBoundaryDynamics<GRID_DIMENSION, Q>
{
    pub fn new(
        descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
        omega: f64,
        direction: usize,
        orientation: Orientation,
    ) -> Self {
        DensityBoundaryDynamics {
            descriptor,
            omega,
            direction,
            orientation,
        }
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Dynamics<GRID_DIMENSION, Q>
    for DensityBoundaryDynamics<GRID_DIMENSION, Q>
{
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::DensityBoundary {
            direction: self.direction,
            orientation: self.orientation,
        }
    }

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.descriptor
    }

    fn collide(&self, cell: &mut Cell<GRID_DIMENSION, Q>) {
        let rho = cell.imposed_density;
        let u = self.velocity(cell);
        complete_populations(
            self.descriptor,
            &mut cell.f,
            self.direction,
            self.orientation,
            rho,
            &u,
        );
        bgk_relax(self.descriptor, &mut cell.f, rho, &u, self.omega);
    }

    fn density(&self, cell: &Cell<GRID_DIMENSION, Q>) -> f64 {
        cell.imposed_density
    }

    fn velocity(&self, cell: &Cell<GRID_DIMENSION, Q>) -> Tensor<GRID_DIMENSION> {
        let (tangential, outgoing) =
            boundary_sums(self.descriptor, &cell.f, self.direction, self.orientation);
        let mut u = cell.imposed_velocity;
        u[self.direction] = self.orientation.sign() as f64
            * ((tangential + 2.0 * outgoing) / cell.imposed_density - 1.0);
        u
    }

    fn omega(&self) -> f64 {
        self.omega
    }
}

/// Resets the cell to equilibrium at its own density and the imposed
/// velocity on every update.
#[derive(Debug, Clone)]
pub struct EquilibriumDynamics<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    EquilibriumDynamics<GRID_DIMENSION, Q>
{
    pub fn new(descriptor: &'static Descriptor<GRID_DIMENSION, Q>) -> Self {
        EquilibriumDynamics { descriptor }
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Dynamics<GRID_DIMENSION, Q>
    for EquilibriumDynamics<GRID_DIMENSION, Q>
{
    fn kind(&self) -> DynamicsKind {
        DynamicsKind::Equilibrium
    }

    fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.descriptor
    }

    fn collide(&self, cell: &mut Cell<GRID_DIMENSION, Q>) {
        let rho = cell.raw_density();
        let u = cell.imposed_velocity;
        cell.f = self.descriptor.equilibrium_populations(rho, &u);
    }

    fn velocity(&self, cell: &Cell<GRID_DIMENSION, Q>) -> Tensor<GRID_DIMENSION> {
        cell.imposed_velocity
    }
}
