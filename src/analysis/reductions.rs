//! Reductions of fields to global scalars.
//!
//! The general form is counting cells that satisfy a predicate; sums,
//! averages and extrema fold a numeric transform of each cell.

use super::*;
use crate::lattice::{Cell, CellField};

/// Sum, count, minimum and maximum of `transform` over the cells.
#[derive(Clone)]
pub struct CellReduction<F> {
    transform: F,
    statistics: StatisticsRegistry,
    sum: SumId,
    count: IntSumId,
    min: MinId,
    max: MaxId,
}

impl<F> CellReduction<F> {
    pub fn new(transform: F) -> Self {
        let mut statistics = StatisticsRegistry::new();
        let sum = statistics.subscribe_sum();
        let count = statistics.subscribe_int_sum();
        let min = statistics.subscribe_min();
        let max = statistics.subscribe_max();
        CellReduction {
            transform,
            statistics,
            sum,
            count,
            min,
            max,
        }
    }

    pub fn sum(&self) -> f64 {
        self.statistics.sum(self.sum)
    }

    pub fn count(&self) -> i64 {
        self.statistics.int_sum(self.count)
    }

    /// Zero for an empty domain.
    pub fn average(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.sum() / n as f64,
        }
    }

    pub fn min(&self) -> f64 {
        self.statistics.min(self.min)
    }

    pub fn max(&self) -> f64 {
        self.statistics.max(self.max)
    }
}

impl<F: Send> Functional for CellReduction<F> {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl<F> Reductive for CellReduction<F> {
    fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry {
        &mut self.statistics
    }
}

impl<T, F, const GRID_DIMENSION: usize> BoxFunctional<T, GRID_DIMENSION>
    for CellReduction<F>
where
    T: Clone + Send + Sync,
    F: Fn(&T) -> f64 + Send,
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            let v = (self.transform)(field.get(&c));
            self.statistics.gather_sum(self.sum, v);
            self.statistics.gather_int_sum(self.count, 1);
            self.statistics.gather_min(self.min, v);
            self.statistics.gather_max(self.max, v);
        }
    }
}

/// Number of cells satisfying a predicate.
#[derive(Clone)]
pub struct CountFunctional<P> {
    predicate: P,
    statistics: StatisticsRegistry,
    count: IntSumId,
}

impl<P> CountFunctional<P> {
    pub fn new(predicate: P) -> Self {
        let mut statistics = StatisticsRegistry::new();
        let count = statistics.subscribe_int_sum();
        CountFunctional {
            predicate,
            statistics,
            count,
        }
    }

    pub fn count(&self) -> i64 {
        self.statistics.int_sum(self.count)
    }
}

impl<P: Send> Functional for CountFunctional<P> {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl<P> Reductive for CountFunctional<P> {
    fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry {
        &mut self.statistics
    }
}

impl<T, P, const GRID_DIMENSION: usize> BoxFunctional<T, GRID_DIMENSION>
    for CountFunctional<P>
where
    T: Clone + Send + Sync,
    P: Fn(&T) -> bool + Send,
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        let n = domain
            .coord_iter()
            .filter(|c| (self.predicate)(field.get(c)))
            .count();
        self.statistics.gather_int_sum(self.count, n as i64);
    }
}

/// Sum with trapezoid-rule weights: cells on the outer layer of the block
/// count half per axis they touch the boundary on.
#[derive(Debug, Clone)]
pub struct BoundedSum {
    statistics: StatisticsRegistry,
    sum: SumId,
    weight: SumId,
}

impl Default for BoundedSum {
    fn default() -> Self {
        let mut statistics = StatisticsRegistry::new();
        let sum = statistics.subscribe_sum();
        let weight = statistics.subscribe_sum();
        BoundedSum {
            statistics,
            sum,
            weight,
        }
    }
}

impl BoundedSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum(&self) -> f64 {
        self.statistics.sum(self.sum)
    }

    /// Weighted number of cells.
    pub fn weight(&self) -> f64 {
        self.statistics.sum(self.weight)
    }

    pub fn average(&self) -> f64 {
        let w = self.weight();
        if w == 0.0 {
            0.0
        } else {
            self.sum() / w
        }
    }

    fn gather<const GRID_DIMENSION: usize>(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &Operand<'_, f64, GRID_DIMENSION>,
        weight: f64,
    ) {
        let mut sum = 0.0;
        for c in domain.coord_iter() {
            sum += *field.get(&c);
        }
        self.statistics.gather_sum(self.sum, weight * sum);
        self.statistics
            .gather_sum(self.weight, weight * domain.buffer_size() as f64);
    }
}

impl Functional for BoundedSum {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl Reductive for BoundedSum {
    fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry {
        &mut self.statistics
    }
}

impl<const GRID_DIMENSION: usize> BoundedFunctional<f64, GRID_DIMENSION>
    for BoundedSum
{
    fn process_bulk(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, f64, GRID_DIMENSION>,
    ) {
        self.gather(domain, field, 1.0);
    }

    fn process_face(
        &mut self,
        _direction: usize,
        _orientation: Orientation,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, f64, GRID_DIMENSION>,
    ) {
        self.gather(domain, field, 0.5);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<GRID_DIMENSION>,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, f64, GRID_DIMENSION>,
    ) {
        let codimension = Region::from_normal(normal).codimension();
        self.gather(domain, field, 0.5f64.powi(codimension as i32));
    }
}

pub fn reduce_cells<T, F, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
    transform: F,
) -> CellReduction<F>
where
    T: Clone + Send + Sync,
    F: Fn(&T) -> f64 + Send,
{
    reduce(CellReduction::new(transform), *domain, field)
}

pub fn compute_sum<const GRID_DIMENSION: usize>(
    field: &ScalarField<GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_cells(field, domain, |v: &f64| *v).sum()
}

pub fn compute_average<const GRID_DIMENSION: usize>(
    field: &ScalarField<GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_cells(field, domain, |v: &f64| *v).average()
}

pub fn compute_min<const GRID_DIMENSION: usize>(
    field: &ScalarField<GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_cells(field, domain, |v: &f64| *v).min()
}

pub fn compute_max<const GRID_DIMENSION: usize>(
    field: &ScalarField<GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_cells(field, domain, |v: &f64| *v).max()
}

pub fn compute_bounded_sum<const GRID_DIMENSION: usize>(
    field: &ScalarField<GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_bounded(BoundedSum::new(), *domain, field).sum()
}

pub fn compute_bounded_average<const GRID_DIMENSION: usize>(
    field: &ScalarField<GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_bounded(BoundedSum::new(), *domain, field).average()
}

pub fn count<T, P, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    domain: &AABB<GRID_DIMENSION>,
    predicate: P,
) -> i64
where
    T: Clone + Send + Sync,
    P: Fn(&T) -> bool + Send,
{
    reduce(CountFunctional::new(predicate), *domain, field).count()
}

pub fn compute_average_density<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_cells(cells, domain, |c: &Cell<GRID_DIMENSION, Q>| c.density())
        .average()
}

/// Average of `|u|^2 / 2`.
pub fn compute_average_energy<const GRID_DIMENSION: usize, const Q: usize>(
    cells: &CellField<GRID_DIMENSION, Q>,
    domain: &AABB<GRID_DIMENSION>,
) -> f64 {
    reduce_cells(cells, domain, |c: &Cell<GRID_DIMENSION, Q>| {
        0.5 * c.velocity().norm_squared()
    })
    .average()
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn scalar_sum_test() {
        let f = ScalarField::new(vector![4, 4], 2.0);
        assert_eq!(compute_sum(&f, &f.bounding_box()), 32.0);
        assert_eq!(compute_average(&f, &f.bounding_box()), 2.0);
    }

    #[test]
    fn extrema_test() {
        let f = ScalarField::from_fn(vector![3, 5], 0.0, |c| (c[0] - c[1]) as f64);
        let all = f.bounding_box();
        assert_eq!(compute_min(&f, &all), -4.0);
        assert_eq!(compute_max(&f, &all), 2.0);
        let part = AABB::new(matrix![1, 1; 0, 4]);
        assert_eq!(compute_max(&f, &part), 1.0);
    }

    #[test]
    fn count_test() {
        let f = ScalarField::from_fn(vector![4, 4], 0.0, |c| c[0] as f64);
        assert_eq!(count(&f, &f.bounding_box(), |v| *v >= 2.0), 8);
        assert_eq!(count(&f, &AABB::new(matrix![9, 9; 9, 9]), |_| true), 0);
    }

    #[test]
    fn bounded_sum_test() {
        // Trapezoid rule on a 3x3 block of ones: 1 + 4 / 2 + 4 / 4.
        let f = ScalarField::new(vector![3, 3], 1.0);
        let all = f.bounding_box();
        assert_approx_eq!(f64, compute_bounded_sum(&f, &all), 4.0, ulps = 2);
        assert_approx_eq!(f64, compute_bounded_average(&f, &all), 1.0, ulps = 2);
    }
}
