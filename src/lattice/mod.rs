//! A minimal lattice Boltzmann block: the cells the boundary machinery
//! and the analysis functionals operate on.

mod block;
mod dynamics;

pub use block::*;
pub use dynamics::*;

use crate::field::Tensor;
use std::fmt;
use std::sync::Arc;

pub type Matrix<const N: usize> = nalgebra::SMatrix<f64, N, N>;

/// Discrete velocity set.
#[derive(Debug, PartialEq)]
pub struct Descriptor<const GRID_DIMENSION: usize, const Q: usize> {
    pub name: &'static str,
    pub velocities: [[i32; GRID_DIMENSION]; Q],
    pub weights: [f64; Q],
    /// Squared speed of sound.
    pub cs2: f64,
}

pub static D2Q9: Descriptor<2, 9> = Descriptor {
    name: "D2Q9",
    velocities: [
        [0, 0],
        [-1, 1],
        [-1, 0],
        [-1, -1],
        [0, -1],
        [1, -1],
        [1, 0],
        [1, 1],
        [0, 1],
    ],
    weights: [
        4.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
        1.0 / 36.0,
        1.0 / 9.0,
    ],
    cs2: 1.0 / 3.0,
};

pub static D3Q19: Descriptor<3, 19> = Descriptor {
    name: "D3Q19",
    velocities: [
        [0, 0, 0],
        [-1, 0, 0],
        [0, -1, 0],
        [0, 0, -1],
        [-1, -1, 0],
        [-1, 1, 0],
        [-1, 0, -1],
        [-1, 0, 1],
        [0, -1, -1],
        [0, -1, 1],
        [1, 0, 0],
        [0, 1, 0],
        [0, 0, 1],
        [1, 1, 0],
        [1, -1, 0],
        [1, 0, 1],
        [1, 0, -1],
        [0, 1, 1],
        [0, 1, -1],
    ],
    weights: [
        1.0 / 3.0,
        1.0 / 18.0,
        1.0 / 18.0,
        1.0 / 18.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 18.0,
        1.0 / 18.0,
        1.0 / 18.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
        1.0 / 36.0,
    ],
    cs2: 1.0 / 3.0,
};

impl<const GRID_DIMENSION: usize, const Q: usize>
    Descriptor<GRID_DIMENSION, Q>
{
    /// Index of the velocity pointing the other way.
    pub fn opposite(&self, i: usize) -> usize {
        let c = self.velocities[i];
        (0..Q)
            .find(|j| (0..GRID_DIMENSION).all(|d| self.velocities[*j][d] == -c[d]))
            .unwrap_or(i)
    }

    pub fn c_dot(&self, i: usize, u: &Tensor<GRID_DIMENSION>) -> f64 {
        (0..GRID_DIMENSION)
            .map(|d| self.velocities[i][d] as f64 * u[d])
            .sum()
    }

    /// Second-order equilibrium population.
    pub fn equilibrium(
        &self,
        i: usize,
        rho: f64,
        u: &Tensor<GRID_DIMENSION>,
    ) -> f64 {
        let cu = self.c_dot(i, u);
        let u_sqr = u.norm_squared();
        self.weights[i]
            * rho
            * (1.0 + cu / self.cs2 + 0.5 * cu * cu / (self.cs2 * self.cs2)
                - 0.5 * u_sqr / self.cs2)
    }

    pub fn equilibrium_populations(
        &self,
        rho: f64,
        u: &Tensor<GRID_DIMENSION>,
    ) -> [f64; Q] {
        std::array::from_fn(|i| self.equilibrium(i, rho, u))
    }
}

/// One lattice site.
#[derive(Clone)]
pub struct Cell<const GRID_DIMENSION: usize, const Q: usize> {
    pub f: [f64; Q],
    dynamics: Arc<dyn Dynamics<GRID_DIMENSION, Q>>,
    /// Density imposed by pressure boundaries, written by completion
    /// processors for Neumann-type conditions.
    pub imposed_density: f64,
    /// Velocity imposed by velocity boundaries.
    pub imposed_velocity: Tensor<GRID_DIMENSION>,
}

impl<const GRID_DIMENSION: usize, const Q: usize> fmt::Debug
    for Cell<GRID_DIMENSION, Q>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("f", &self.f)
            .field("dynamics", &self.dynamics.kind())
            .finish()
    }
}

impl<const GRID_DIMENSION: usize, const Q: usize> Cell<GRID_DIMENSION, Q> {
    pub fn new(dynamics: Arc<dyn Dynamics<GRID_DIMENSION, Q>>) -> Self {
        let descriptor = dynamics.descriptor();
        Cell {
            f: descriptor.equilibrium_populations(1.0, &Tensor::zeros()),
            dynamics,
            imposed_density: 1.0,
            imposed_velocity: Tensor::zeros(),
        }
    }

    pub fn dynamics(&self) -> &Arc<dyn Dynamics<GRID_DIMENSION, Q>> {
        &self.dynamics
    }

    pub fn set_dynamics(&mut self, dynamics: Arc<dyn Dynamics<GRID_DIMENSION, Q>>) {
        self.dynamics = dynamics;
    }

    pub fn descriptor(&self) -> &'static Descriptor<GRID_DIMENSION, Q> {
        self.dynamics.descriptor()
    }

    pub fn collide(&mut self) {
        let dynamics = Arc::clone(&self.dynamics);
        dynamics.collide(self);
    }

    /// Sum of the populations, ignoring what the dynamics imposes.
    pub fn raw_density(&self) -> f64 {
        self.f.iter().sum()
    }

    pub fn momentum(&self) -> Tensor<GRID_DIMENSION> {
        let descriptor = self.descriptor();
        let mut j = Tensor::zeros();
        for (i, f) in self.f.iter().enumerate() {
            for d in 0..GRID_DIMENSION {
                j[d] += descriptor.velocities[i][d] as f64 * f;
            }
        }
        j
    }

    pub fn raw_velocity(&self) -> Tensor<GRID_DIMENSION> {
        self.momentum() / self.raw_density()
    }

    pub fn density(&self) -> f64 {
        self.dynamics.density(self)
    }

    pub fn velocity(&self) -> Tensor<GRID_DIMENSION> {
        self.dynamics.velocity(self)
    }

    /// Off-equilibrium part of the momentum flux.
    pub fn pi_neq(&self) -> Matrix<GRID_DIMENSION> {
        let descriptor = self.descriptor();
        let rho = self.density();
        let u = self.velocity();
        let mut pi = Matrix::zeros();
        for i in 0..Q {
            let f_neq = self.f[i] - descriptor.equilibrium(i, rho, &u);
            let c = &descriptor.velocities[i];
            for a in 0..GRID_DIMENSION {
                for b in 0..GRID_DIMENSION {
                    pi[(a, b)] += (c[a] * c[b]) as f64 * f_neq;
                }
            }
        }
        pi
    }

    pub fn define_equilibrium(&mut self, rho: f64, u: &Tensor<GRID_DIMENSION>) {
        self.f = self.descriptor().equilibrium_populations(rho, u);
    }
}
