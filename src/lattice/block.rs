use super::*;
use crate::field::*;
use crate::functional::*;
use crate::util::*;
use rayon::prelude::*;
use std::collections::BTreeMap;

pub type CellField<const GRID_DIMENSION: usize, const Q: usize> =
    Field<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>;

pub type CellProcessor<const GRID_DIMENSION: usize, const Q: usize> =
    DataProcessorGenerator<Cell<GRID_DIMENSION, Q>, GRID_DIMENSION>;

/// A block of cells updated by collision and streaming, followed by its
/// internal processors.
pub struct BlockLattice<const GRID_DIMENSION: usize, const Q: usize> {
    cells: CellField<GRID_DIMENSION, Q>,
    periodic: [bool; GRID_DIMENSION],
    processors: BTreeMap<ProcessorLevel, Vec<CellProcessor<GRID_DIMENSION, Q>>>,
    chunk_size: usize,
    steps: usize,
}

impl<const GRID_DIMENSION: usize, const Q: usize> BlockLattice<GRID_DIMENSION, Q> {
    pub fn new(
        shape: Coord<GRID_DIMENSION>,
        background: Arc<dyn Dynamics<GRID_DIMENSION, Q>>,
    ) -> Self {
        BlockLattice {
            cells: Field::new(shape, Cell::new(background)),
            periodic: [false; GRID_DIMENSION],
            processors: BTreeMap::new(),
            chunk_size: 1024,
            steps: 0,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn cells(&self) -> &CellField<GRID_DIMENSION, Q> {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut CellField<GRID_DIMENSION, Q> {
        &mut self.cells
    }

    pub fn bounding_box(&self) -> AABB<GRID_DIMENSION> {
        self.cells.bounding_box()
    }

    pub fn get(&self, coord: &Coord<GRID_DIMENSION>) -> &Cell<GRID_DIMENSION, Q> {
        self.cells.get(coord)
    }

    pub fn get_mut(
        &mut self,
        coord: &Coord<GRID_DIMENSION>,
    ) -> &mut Cell<GRID_DIMENSION, Q> {
        self.cells.get_mut(coord)
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn set_periodic(&mut self, axis: usize, periodic: bool) {
        self.periodic[axis] = periodic;
    }

    pub fn define_dynamics(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        dynamics: Arc<dyn Dynamics<GRID_DIMENSION, Q>>,
    ) {
        if let Some(domain) = domain.intersection(&self.cells.bounding_box()) {
            for c in domain.coord_iter() {
                self.cells.get_mut(&c).set_dynamics(Arc::clone(&dynamics));
            }
        }
    }

    pub fn initialize_at_equilibrium(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        rho: f64,
        u: &Tensor<GRID_DIMENSION>,
    ) {
        if let Some(domain) = domain.intersection(&self.cells.bounding_box()) {
            for c in domain.coord_iter() {
                let cell = self.cells.get_mut(&c);
                cell.define_equilibrium(rho, u);
                cell.imposed_density = rho;
                cell.imposed_velocity = *u;
            }
        }
    }

    pub fn add_internal_processor(
        &mut self,
        processor: CellProcessor<GRID_DIMENSION, Q>,
        level: ProcessorLevel,
    ) {
        self.processors.entry(level).or_default().push(processor);
    }

    pub fn internal_processors(
        &self,
        level: ProcessorLevel,
    ) -> &[CellProcessor<GRID_DIMENSION, Q>] {
        self.processors.get(&level).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn execute_internal_processors(&mut self, level: ProcessorLevel) {
        profiling::scope!("lattice::internal_processors");
        if let Some(processors) = self.processors.get(&level) {
            for p in processors {
                p.apply_to(&mut self.cells);
            }
        }
    }

    pub fn collide(&mut self) {
        profiling::scope!("lattice::collide");
        self.cells.par_for_each_mut(|_, cell| cell.collide(), self.chunk_size);
    }

    /// Pull streaming. Populations with a source outside the block are
    /// kept as they are unless the axis is periodic; boundary dynamics
    /// rebuild them.
    pub fn stream(&mut self) {
        profiling::scope!("lattice::stream");
        let aabb = self.cells.bounding_box();
        let shape = aabb.exclusive_bounds();
        let periodic = self.periodic;
        let cells = &self.cells;
        let streamed: Vec<[f64; Q]> = (0..aabb.buffer_size())
            .into_par_iter()
            .map(|index| {
                let coord = aabb.linear_to_coord(index);
                let descriptor = cells.get(&coord).descriptor();
                std::array::from_fn(|i| {
                    let mut source = coord;
                    let mut inside = true;
                    for d in 0..GRID_DIMENSION {
                        source[d] -= descriptor.velocities[i][d];
                        if periodic[d] {
                            source[d] = source[d].rem_euclid(shape[d]);
                        } else if source[d] < 0 || source[d] >= shape[d] {
                            inside = false;
                        }
                    }
                    if inside {
                        cells.get(&source).f[i]
                    } else {
                        cells.get(&coord).f[i]
                    }
                })
            })
            .collect();
        self.cells
            .buffer_mut()
            .par_iter_mut()
            .zip(streamed.into_par_iter())
            .for_each(|(cell, f)| cell.f = f);
    }

    /// One full update: collision, streaming, then the internal
    /// processors by increasing level.
    pub fn collide_and_stream(&mut self) {
        profiling::scope!("lattice::collide_and_stream");
        self.collide();
        self.stream();
        let levels: Vec<ProcessorLevel> = self.processors.keys().copied().collect();
        for level in levels {
            self.execute_internal_processors(level);
        }
        self.steps += 1;
    }
}
