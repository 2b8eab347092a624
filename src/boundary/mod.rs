//! Boundary conditions on lattice blocks.
//!
//! A request for a boundary condition is classified once, at setup time,
//! into a plan: which dynamics the boundary cells get, and which
//! completion processor (if any) runs after every update to fill in the
//! values the condition leaves open. Faces of a block and its corners are
//! told apart by the bounded dispatcher.

mod processors;

pub use processors::*;

use crate::field::*;
use crate::functional::*;
use crate::lattice::*;
use crate::util::*;
use std::sync::Arc;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BoundaryKind {
    Dirichlet,
    Neumann,
    Outflow,
    NormalOutflow,
    FreeSlip,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BoundaryVariable {
    Velocity,
    Pressure,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BoundaryLocation<const GRID_DIMENSION: usize> {
    Face {
        direction: usize,
        orientation: Orientation,
    },
    /// Convex corner of the fluid domain, or a 3D edge.
    ExternalCorner { normal: Coord<GRID_DIMENSION> },
    /// Concave corner of the fluid domain.
    InternalCorner { normal: Coord<GRID_DIMENSION> },
}

/// Dynamics given to the boundary cells.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BoundaryDynamics {
    /// The cells keep whatever dynamics they had.
    Keep,
    Velocity {
        direction: usize,
        orientation: Orientation,
    },
    Density {
        direction: usize,
        orientation: Orientation,
    },
    Equilibrium,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompletionKind<const GRID_DIMENSION: usize> {
    Velocity {
        direction: usize,
        orientation: Orientation,
        copy: VelocityCopy,
    },
    Density {
        direction: usize,
        orientation: Orientation,
    },
    ExternalCorner {
        normal: Coord<GRID_DIMENSION>,
        copy_velocity: bool,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BoundaryPlan<const GRID_DIMENSION: usize> {
    pub dynamics: BoundaryDynamics,
    pub completion: Option<CompletionKind<GRID_DIMENSION>>,
    pub level: ProcessorLevel,
}

/// The fixed table of boundary treatments.
///
/// Panics for pressure conditions on corners: pressure conditions only
/// exist on faces.
#[track_caller]
pub fn classify<const GRID_DIMENSION: usize>(
    kind: BoundaryKind,
    variable: BoundaryVariable,
    location: BoundaryLocation<GRID_DIMENSION>,
) -> BoundaryPlan<GRID_DIMENSION> {
    use BoundaryKind::*;
    let (dynamics, completion) = match (variable, location) {
        (
            BoundaryVariable::Velocity,
            BoundaryLocation::Face {
                direction,
                orientation,
            },
        ) => {
            let copy = match kind {
                Dirichlet => None,
                Neumann => Some(VelocityCopy::Full),
                Outflow => Some(VelocityCopy::Outflow),
                NormalOutflow => Some(VelocityCopy::NormalOnly),
                FreeSlip => Some(VelocityCopy::TangentialOnly),
            };
            (
                BoundaryDynamics::Velocity {
                    direction,
                    orientation,
                },
                copy.map(|copy| CompletionKind::Velocity {
                    direction,
                    orientation,
                    copy,
                }),
            )
        }
        (
            BoundaryVariable::Pressure,
            BoundaryLocation::Face {
                direction,
                orientation,
            },
        ) => {
            let completion = match kind {
                Dirichlet | NormalOutflow => None,
                Neumann => Some(CompletionKind::Density {
                    direction,
                    orientation,
                }),
                Outflow | FreeSlip => Some(CompletionKind::Velocity {
                    direction,
                    orientation,
                    copy: VelocityCopy::TangentialOnly,
                }),
            };
            (
                BoundaryDynamics::Density {
                    direction,
                    orientation,
                },
                completion,
            )
        }
        (BoundaryVariable::Velocity, BoundaryLocation::ExternalCorner { normal }) => (
            BoundaryDynamics::Keep,
            Some(CompletionKind::ExternalCorner {
                normal,
                copy_velocity: kind != Dirichlet,
            }),
        ),
        (BoundaryVariable::Velocity, BoundaryLocation::InternalCorner { .. }) => {
            (BoundaryDynamics::Equilibrium, None)
        }
        (BoundaryVariable::Pressure, _) => panic!(
            "pressure boundary conditions are defined on faces only, \
             not on corners ({:?})",
            location
        ),
    };
    let level = if completion.is_some() {
        ProcessorLevel::AFTER_COMMUNICATION
    } else {
        ProcessorLevel::IMMEDIATE
    };
    BoundaryPlan {
        dynamics,
        completion,
        level,
    }
}

/// Sets up boundary conditions on block lattices; boundary dynamics
/// relax with `omega`.
#[derive(Debug, Clone)]
pub struct BoundaryConditionSetter<const GRID_DIMENSION: usize, const Q: usize> {
    descriptor: &'static Descriptor<GRID_DIMENSION, Q>,
    omega: f64,
}

impl<const GRID_DIMENSION: usize, const Q: usize>
    BoundaryConditionSetter<GRID_DIMENSION, Q>
{
    pub fn new(descriptor: &'static Descriptor<GRID_DIMENSION, Q>, omega: f64) -> Self {
        BoundaryConditionSetter { descriptor, omega }
    }

    fn make_dynamics(
        &self,
        choice: BoundaryDynamics,
    ) -> Option<Arc<dyn Dynamics<GRID_DIMENSION, Q>>> {
        match choice {
            BoundaryDynamics::Keep => None,
            BoundaryDynamics::Velocity {
                direction,
                orientation,
            } => Some(Arc::new(VelocityBoundaryDynamics::new(
                self.descriptor,
                self.omega,
                direction,
                orientation,
            ))),
            BoundaryDynamics::Density {
                direction,
                orientation,
            } => Some(Arc::new(DensityBoundaryDynamics::new(
                self.descriptor,
                self.omega,
                direction,
                orientation,
            ))),
            BoundaryDynamics::Equilibrium => {
                Some(Arc::new(EquilibriumDynamics::new(self.descriptor)))
            }
        }
    }

    fn completion_processor(
        completion: CompletionKind<GRID_DIMENSION>,
        domain: AABB<GRID_DIMENSION>,
    ) -> CellProcessor<GRID_DIMENSION, Q> {
        match completion {
            CompletionKind::Velocity {
                direction,
                orientation,
                copy,
            } => DataProcessorGenerator::new(
                VelocityCompletion {
                    direction,
                    orientation,
                    copy,
                },
                domain,
            ),
            CompletionKind::Density {
                direction,
                orientation,
            } => DataProcessorGenerator::new(
                DensityCompletion {
                    direction,
                    orientation,
                },
                domain,
            ),
            CompletionKind::ExternalCorner {
                normal,
                copy_velocity,
            } => DataProcessorGenerator::new(
                ExternalCornerCompletion {
                    normal,
                    copy_velocity,
                },
                domain,
            ),
        }
    }

    /// Carry out a plan on `domain`.
    pub fn instantiate(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        plan: &BoundaryPlan<GRID_DIMENSION>,
    ) {
        tracing::debug!("boundary plan {:?} on {}", plan, domain);
        if let Some(dynamics) = self.make_dynamics(plan.dynamics) {
            lattice.define_dynamics(domain, dynamics);
        }
        if let Some(completion) = plan.completion {
            lattice.add_internal_processor(
                Self::completion_processor(completion, *domain),
                plan.level,
            );
        }
    }

    #[track_caller]
    fn add_face(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        direction: usize,
        orientation: Orientation,
        kind: BoundaryKind,
        variable: BoundaryVariable,
    ) {
        assert_eq!(
            domain.degenerate_axes(),
            1,
            "boundary box {} must be one cell thick along exactly one axis",
            domain
        );
        assert!(
            domain.bounds[(direction, 0)] == domain.bounds[(direction, 1)],
            "boundary box {} is not flat along axis {}",
            domain,
            direction
        );
        let plan = classify(
            kind,
            variable,
            BoundaryLocation::Face {
                direction,
                orientation,
            },
        );
        self.instantiate(lattice, domain, &plan);
    }

    #[track_caller]
    pub fn add_velocity_boundary(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        direction: usize,
        orientation: Orientation,
        kind: BoundaryKind,
    ) {
        self.add_face(
            lattice,
            domain,
            direction,
            orientation,
            kind,
            BoundaryVariable::Velocity,
        );
    }

    #[track_caller]
    pub fn add_pressure_boundary(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        direction: usize,
        orientation: Orientation,
        kind: BoundaryKind,
    ) {
        self.add_face(
            lattice,
            domain,
            direction,
            orientation,
            kind,
            BoundaryVariable::Pressure,
        );
    }

    #[track_caller]
    pub fn add_external_velocity_corner(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        coord: &Coord<GRID_DIMENSION>,
        normal: &Coord<GRID_DIMENSION>,
        kind: BoundaryKind,
    ) {
        assert_corner_normal(normal);
        let plan = classify(
            kind,
            BoundaryVariable::Velocity,
            BoundaryLocation::ExternalCorner { normal: *normal },
        );
        self.instantiate(lattice, &AABB::from_mm(*coord, *coord), &plan);
    }

    #[track_caller]
    pub fn add_internal_velocity_corner(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        coord: &Coord<GRID_DIMENSION>,
        normal: &Coord<GRID_DIMENSION>,
        kind: BoundaryKind,
    ) {
        assert_corner_normal(normal);
        let plan = classify(
            kind,
            BoundaryVariable::Velocity,
            BoundaryLocation::InternalCorner { normal: *normal },
        );
        self.instantiate(lattice, &AABB::from_mm(*coord, *coord), &plan);
    }

    pub fn set_boundary_velocity(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        velocity: &Tensor<GRID_DIMENSION>,
    ) {
        apply(
            ImposeVelocity {
                velocity: *velocity,
            },
            *domain,
            lattice.cells_mut(),
        );
    }

    pub fn set_boundary_density(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        density: f64,
    ) {
        apply(ImposeDensity { density }, *domain, lattice.cells_mut());
    }

    /// Classify every part of `domain` lying on the outer layer of the
    /// lattice, faces and corners alike, and instantiate the plans.
    /// Returns the locations found, in the order they were set up.
    #[track_caller]
    pub fn set_condition_on_block_boundaries(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        kind: BoundaryKind,
        variable: BoundaryVariable,
    ) -> Vec<(BoundaryLocation<GRID_DIMENSION>, AABB<GRID_DIMENSION>)> {
        tracing::info!(
            "setting {:?} {:?} condition on {} of block {}",
            kind,
            variable,
            domain,
            lattice.bounding_box()
        );
        let mut locations = Vec::new();
        apply_bounded(
            BoundaryLocator {
                locations: &mut locations,
            },
            *domain,
            lattice.cells(),
        );
        let plans: Vec<_> = locations
            .iter()
            .map(|(location, _)| classify(kind, variable, *location))
            .collect();
        for ((_, region), plan) in locations.iter().zip(&plans) {
            self.instantiate(lattice, region, plan);
        }
        locations
    }

    #[track_caller]
    pub fn set_velocity_condition_on_block_boundaries(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        kind: BoundaryKind,
    ) -> Vec<(BoundaryLocation<GRID_DIMENSION>, AABB<GRID_DIMENSION>)> {
        self.set_condition_on_block_boundaries(
            lattice,
            domain,
            kind,
            BoundaryVariable::Velocity,
        )
    }

    #[track_caller]
    pub fn set_pressure_condition_on_block_boundaries(
        &self,
        lattice: &mut BlockLattice<GRID_DIMENSION, Q>,
        domain: &AABB<GRID_DIMENSION>,
        kind: BoundaryKind,
    ) -> Vec<(BoundaryLocation<GRID_DIMENSION>, AABB<GRID_DIMENSION>)> {
        self.set_condition_on_block_boundaries(
            lattice,
            domain,
            kind,
            BoundaryVariable::Pressure,
        )
    }
}

/// A corner normal points out of the block along at least two axes,
/// with unit components.
#[track_caller]
pub(crate) fn assert_corner_normal<const GRID_DIMENSION: usize>(
    normal: &Coord<GRID_DIMENSION>,
) {
    let outward = normal.iter().filter(|n| **n != 0).count();
    assert!(
        normal.iter().all(|n| n.abs() <= 1) && outward >= 2,
        "{:?} is not a corner normal",
        normal
    );
}

/// Records which boundary location each piece of a domain belongs to.
/// Cells in the bulk of the block are not on a boundary and are skipped.
struct BoundaryLocator<'a, const GRID_DIMENSION: usize> {
    locations: &'a mut Vec<(BoundaryLocation<GRID_DIMENSION>, AABB<GRID_DIMENSION>)>,
}

impl<const GRID_DIMENSION: usize> Functional for BoundaryLocator<'_, GRID_DIMENSION> {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl<T: Clone + Send + Sync, const GRID_DIMENSION: usize>
    BoundedFunctional<T, GRID_DIMENSION> for BoundaryLocator<'_, GRID_DIMENSION>
{
    fn process_bulk(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        _field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        tracing::debug!("{} lies in the bulk, no boundary condition", domain);
    }

    fn process_face(
        &mut self,
        direction: usize,
        orientation: Orientation,
        domain: &AABB<GRID_DIMENSION>,
        _field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        self.locations.push((
            BoundaryLocation::Face {
                direction,
                orientation,
            },
            *domain,
        ));
    }

    fn process_corner(
        &mut self,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        _field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        self.locations
            .push((BoundaryLocation::ExternalCorner { normal: *normal }, *domain));
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn classification_test() {
        let face = BoundaryLocation::<2>::Face {
            direction: 0,
            orientation: Orientation::Negative,
        };
        let dirichlet = classify(BoundaryKind::Dirichlet, BoundaryVariable::Velocity, face);
        assert_eq!(dirichlet.completion, None);
        assert_eq!(dirichlet.level, ProcessorLevel::IMMEDIATE);

        let free_slip = classify(BoundaryKind::FreeSlip, BoundaryVariable::Velocity, face);
        assert_eq!(free_slip.level, ProcessorLevel::AFTER_COMMUNICATION);
        assert!(matches!(
            free_slip.completion,
            Some(CompletionKind::Velocity {
                copy: VelocityCopy::TangentialOnly,
                ..
            })
        ));

        let neumann = classify(BoundaryKind::Neumann, BoundaryVariable::Pressure, face);
        assert!(matches!(neumann.completion, Some(CompletionKind::Density { .. })));
        assert!(matches!(neumann.dynamics, BoundaryDynamics::Density { .. }));

        let internal = classify(
            BoundaryKind::Dirichlet,
            BoundaryVariable::Velocity,
            BoundaryLocation::InternalCorner {
                normal: vector![1, 1],
            },
        );
        assert_eq!(internal.dynamics, BoundaryDynamics::Equilibrium);
    }

    #[test]
    #[should_panic(expected = "defined on faces only")]
    fn pressure_corner_classification_test() {
        classify(
            BoundaryKind::Dirichlet,
            BoundaryVariable::Pressure,
            BoundaryLocation::ExternalCorner {
                normal: vector![-1, 1],
            },
        );
    }

    #[test]
    #[should_panic(expected = "is not a corner normal")]
    fn zero_corner_normal_test() {
        let mut lattice =
            BlockLattice::<2, 9>::new(vector![5, 5], Arc::new(BgkDynamics::new(&D2Q9, 1.0)));
        let setter = BoundaryConditionSetter::new(&D2Q9, 1.0);
        setter.add_external_velocity_corner(
            &mut lattice,
            &vector![0, 0],
            &vector![0, 0],
            BoundaryKind::Dirichlet,
        );
    }

    #[test]
    #[should_panic(expected = "is not a corner normal")]
    fn face_normal_as_corner_test() {
        let mut lattice =
            BlockLattice::<2, 9>::new(vector![5, 5], Arc::new(BgkDynamics::new(&D2Q9, 1.0)));
        let setter = BoundaryConditionSetter::new(&D2Q9, 1.0);
        setter.add_internal_velocity_corner(
            &mut lattice,
            &vector![4, 2],
            &vector![1, 0],
            BoundaryKind::Dirichlet,
        );
    }

    #[test]
    #[should_panic(expected = "exactly one axis")]
    fn non_degenerate_face_test() {
        let mut lattice =
            BlockLattice::<2, 9>::new(vector![5, 5], Arc::new(BgkDynamics::new(&D2Q9, 1.0)));
        let setter = BoundaryConditionSetter::new(&D2Q9, 1.0);
        setter.add_velocity_boundary(
            &mut lattice,
            &AABB::new(matrix![0, 1; 0, 4]),
            0,
            Orientation::Negative,
            BoundaryKind::Dirichlet,
        );
    }
}
