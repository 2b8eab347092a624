//! A field split into blocks, processed in parallel.
//!
//! Each block is a `Field` with an envelope mirroring the bulk of its
//! neighbours. Dispatch runs once per block on the part of the requested
//! global domain the block owns. Reductions merge the partial statistics
//! of every block, all-reduce them through a `Communicator` and only then
//! evaluate. After mutating dispatch, envelopes are refreshed from the
//! bulk of the neighbouring blocks.

use crate::communicator::Communicator;
use crate::config::RunConfig;
use crate::field::*;
use crate::functional::*;
use crate::util::*;
use rayon::prelude::*;

pub struct MultiField<T, const GRID_DIMENSION: usize> {
    global: AABB<GRID_DIMENSION>,
    envelope_width: i32,
    /// Global boxes owned by each block.
    bulks: Vec<AABB<GRID_DIMENSION>>,
    blocks: Vec<Field<T, GRID_DIMENSION>>,
}

/// Tiles of at most `block_size` cells per axis covering `global`.
pub fn decompose<const GRID_DIMENSION: usize>(
    global: &AABB<GRID_DIMENSION>,
    block_size: i32,
) -> Vec<AABB<GRID_DIMENSION>> {
    assert!(block_size > 0, "block size must be positive");
    let extent = global.exclusive_bounds();
    let counts = extent.map(|n| (n + block_size - 1) / block_size);
    AABB::from_shape(&counts)
        .coord_iter()
        .map(|index| {
            let min = global.min() + index * block_size;
            let max = (min.add_scalar(block_size - 1)).inf(&global.max());
            AABB::from_mm(min, max)
        })
        .collect()
}

/// Global domain clipped to a block's bulk, in the local coordinates of
/// `block`.
fn local_domain<B: Block<GRID_DIMENSION>, const GRID_DIMENSION: usize>(
    bulk: &AABB<GRID_DIMENSION>,
    block: &B,
    domain: &AABB<GRID_DIMENSION>,
) -> Option<AABB<GRID_DIMENSION>> {
    domain
        .intersection(bulk)
        .map(|d| d.shift(&-block.location()))
}

impl<T: Clone + Send + Sync, const GRID_DIMENSION: usize>
    MultiField<T, GRID_DIMENSION>
{
    pub fn new(
        global: AABB<GRID_DIMENSION>,
        block_size: i32,
        envelope_width: i32,
        value: T,
    ) -> Self {
        let bulks = decompose(&global, block_size);
        let blocks = bulks
            .iter()
            .map(|bulk| Field::covering(bulk, envelope_width, value.clone()))
            .collect();
        tracing::info!(
            "decomposed {} into {} blocks of size {} with envelope {}",
            global,
            bulks.len(),
            block_size,
            envelope_width
        );
        MultiField {
            global,
            envelope_width,
            bulks,
            blocks,
        }
    }

    pub fn from_config(global: AABB<GRID_DIMENSION>, config: &RunConfig, value: T) -> Self {
        Self::new(global, config.block_size, config.envelope_width, value)
    }

    /// Same decomposition as `self`, every cell set to `value`.
    pub fn like<U: Clone + Send + Sync>(&self, value: U) -> MultiField<U, GRID_DIMENSION> {
        MultiField {
            global: self.global,
            envelope_width: self.envelope_width,
            bulks: self.bulks.clone(),
            blocks: self
                .bulks
                .iter()
                .map(|bulk| Field::covering(bulk, self.envelope_width, value.clone()))
                .collect(),
        }
    }

    pub fn global_box(&self) -> AABB<GRID_DIMENSION> {
        self.global
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Field<T, GRID_DIMENSION>] {
        &self.blocks
    }

    pub fn bulks(&self) -> &[AABB<GRID_DIMENSION>] {
        &self.bulks
    }

    /// Block owning a global coordinate.
    pub fn locate(&self, coord: &Coord<GRID_DIMENSION>) -> Option<usize> {
        self.bulks.iter().position(|b| b.contains(coord))
    }

    #[track_caller]
    pub fn get(&self, coord: &Coord<GRID_DIMENSION>) -> &T {
        let i = self
            .locate(coord)
            .unwrap_or_else(|| panic!("{:?} outside of {}", coord, self.global));
        let block = &self.blocks[i];
        block.get(&block.to_local(coord))
    }

    /// Writes the owning block and every envelope mirroring the cell.
    pub fn set(&mut self, coord: &Coord<GRID_DIMENSION>, value: T) {
        for block in self.blocks.iter_mut() {
            if block.global_box().contains(coord) {
                let local = block.to_local(coord);
                block.set(&local, value.clone());
            }
        }
    }

    /// Single field covering the global box, located at its minimum.
    pub fn gather(&self, value: T) -> Field<T, GRID_DIMENSION> {
        let mut result = Field::covering(&self.global, 0, value);
        for (block, bulk) in self.blocks.iter().zip(&self.bulks) {
            for c in bulk.coord_iter() {
                let v = block.get(&block.to_local(&c)).clone();
                result.set(&result.to_local(&c), v);
            }
        }
        result
    }

    /// Refresh every envelope from the bulk of the neighbouring blocks.
    pub fn duplicate_overlaps(&mut self) {
        profiling::scope!("multi_block::duplicate_overlaps");
        let blocks = &self.blocks;
        let bulks = &self.bulks;
        let updates: Vec<Vec<(Coord<GRID_DIMENSION>, T)>> = (0..blocks.len())
            .into_par_iter()
            .map(|i| {
                let full = blocks[i].global_box();
                let mut values = Vec::new();
                for (j, (source, bulk)) in blocks.iter().zip(bulks).enumerate() {
                    if i == j {
                        continue;
                    }
                    if let Some(overlap) = full.intersection(bulk) {
                        for c in overlap.coord_iter() {
                            values.push((
                                blocks[i].to_local(&c),
                                source.get(&source.to_local(&c)).clone(),
                            ));
                        }
                    }
                }
                values
            })
            .collect();
        self.blocks
            .par_iter_mut()
            .zip(updates.into_par_iter())
            .for_each(|(block, values)| {
                for (c, v) in values {
                    block.set(&c, v);
                }
            });
    }

    /// Run `functional` on every block's share of `domain`, then refresh
    /// the envelopes if anything was written.
    pub fn apply<F>(
        &mut self,
        functional: F,
        domain: &AABB<GRID_DIMENSION>,
    ) -> Vec<Application<GRID_DIMENSION>>
    where
        F: BoxFunctional<T, GRID_DIMENSION> + Clone + Sync,
    {
        profiling::scope!("multi_block::apply");
        let bulks = &self.bulks;
        let reports: Vec<Application<GRID_DIMENSION>> = self
            .blocks
            .par_iter_mut()
            .zip(bulks.par_iter())
            .filter_map(|(block, bulk)| {
                let local = local_domain(bulk, block, domain)?;
                Some(crate::functional::apply(functional.clone(), local, block))
            })
            .collect();
        if reports.iter().any(|r| !r.modified.is_empty()) {
            self.duplicate_overlaps();
        }
        reports
    }

    /// Two-field dispatch, `source` read-only. Both fields must share the
    /// same decomposition.
    pub fn apply2<U, F>(
        source: &MultiField<U, GRID_DIMENSION>,
        target: &mut Self,
        functional: F,
        domain: &AABB<GRID_DIMENSION>,
    ) -> Vec<Application<GRID_DIMENSION>>
    where
        U: Clone + Send + Sync,
        F: BoxFunctional2<U, T, GRID_DIMENSION> + Clone + Sync,
    {
        profiling::scope!("multi_block::apply2");
        assert_eq!(
            source.bulks, target.bulks,
            "multi-block fields with different decompositions"
        );
        let bulks = &target.bulks;
        let reports: Vec<Application<GRID_DIMENSION>> = target
            .blocks
            .par_iter_mut()
            .zip(source.blocks.par_iter())
            .zip(bulks.par_iter())
            .filter_map(|((block, source_block), bulk)| {
                let local = local_domain(bulk, source_block, domain)?;
                Some(apply2(functional.clone(), local, source_block, block))
            })
            .collect();
        if reports.iter().any(|r| r.is_modified(1)) {
            target.duplicate_overlaps();
        }
        reports
    }

    fn merge_and_evaluate<F, C>(mut functional: F, partials: Vec<F>, comm: &C) -> F
    where
        F: Reductive,
        C: Communicator + ?Sized,
    {
        for partial in &partials {
            functional.statistics_mut().merge(partial.statistics());
        }
        functional.statistics_mut().all_reduce(comm);
        functional.statistics_mut().evaluate();
        functional
    }

    /// Reduce over `domain`: every block accumulates a copy of
    /// `functional`, the copies are merged into it and all-reduced, then
    /// the result is evaluated.
    pub fn reduce<F, C>(&self, functional: F, domain: &AABB<GRID_DIMENSION>, comm: &C) -> F
    where
        F: BoxFunctional<T, GRID_DIMENSION> + Reductive + Clone + Sync,
        C: Communicator + ?Sized,
    {
        profiling::scope!("multi_block::reduce");
        let partials: Vec<F> = self
            .blocks
            .par_iter()
            .zip(self.bulks.par_iter())
            .filter_map(|(block, bulk)| {
                let local = local_domain(bulk, block, domain)?;
                Some(accumulate(functional.clone(), local, block))
            })
            .collect();
        tracing::debug!("merging {} partial reductions", partials.len());
        Self::merge_and_evaluate(functional, partials, comm)
    }

    /// Boundary-aware reduction. Faces and corners are those of the
    /// global box, not of the individual blocks.
    pub fn reduce_bounded<F, C>(
        &self,
        functional: F,
        domain: &AABB<GRID_DIMENSION>,
        comm: &C,
    ) -> F
    where
        F: BoundedFunctional<T, GRID_DIMENSION> + Reductive + Clone + Sync,
        C: Communicator + ?Sized,
    {
        profiling::scope!("multi_block::reduce_bounded");
        let partials: Vec<F> = self
            .blocks
            .par_iter()
            .zip(self.bulks.par_iter())
            .filter_map(|(block, bulk)| {
                let local = local_domain(bulk, block, domain)?;
                let reference = self.global.shift(&-block.location());
                Some(accumulate_bounded_within(
                    functional.clone(),
                    local,
                    reference,
                    block,
                ))
            })
            .collect();
        Self::merge_and_evaluate(functional, partials, comm)
    }
}
