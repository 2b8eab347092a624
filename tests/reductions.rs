use latblock::analysis::*;
use latblock::communicator::*;
use latblock::field::*;
use latblock::functional::*;
use latblock::multi_block::*;
use latblock::statistics::*;
use latblock::util::*;

use float_cmp::assert_approx_eq;
use rand::prelude::*;

fn random_field(shape: Coord<2>, seed: u64) -> ScalarField<2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut f = ScalarField::new(shape, 0.0);
    for v in f.buffer_mut() {
        *v = rng.gen_range(-10.0..10.0);
    }
    f
}

#[test]
fn partition_associativity_test() {
    let f = random_field(vector![11, 8], 21);
    let all = f.bounding_box();
    let whole = reduce(CellReduction::new(|v: &f64| *v), all, &f);

    let parts = [
        AABB::new(matrix![0, 4; 0, 2]),
        AABB::new(matrix![5, 10; 0, 2]),
        AABB::new(matrix![0, 10; 3, 3]),
        AABB::new(matrix![0, 2; 4, 7]),
        AABB::new(matrix![3, 10; 4, 7]),
    ];
    let template = CellReduction::new(|v: &f64| *v);
    // Accumulate in reverse order to make sure order does not matter.
    let partials: Vec<_> = parts
        .iter()
        .rev()
        .map(|p| accumulate(template.clone(), *p, &f))
        .collect();
    let mut merged = template;
    for p in &partials {
        merged.statistics_mut().merge(p.statistics());
    }
    merged.statistics_mut().evaluate();

    assert_eq!(merged.count(), whole.count());
    assert_eq!(merged.count(), 88);
    assert_approx_eq!(f64, merged.sum(), whole.sum(), epsilon = 1e-10);
    assert_eq!(merged.min(), whole.min());
    assert_eq!(merged.max(), whole.max());
}

#[test]
fn count_partition_test() {
    let f = random_field(vector![10, 10], 5);
    let all = f.bounding_box();
    let positive = |v: &f64| *v > 0.0;
    let total = count(&f, &all, positive);
    let left = count(&f, &AABB::new(matrix![0, 3; 0, 9]), positive);
    let right = count(&f, &AABB::new(matrix![4, 9; 0, 9]), positive);
    assert_eq!(total, left + right);
}

#[test]
fn multi_block_reduce_test() {
    let global = AABB::new(matrix![0, 13; -2, 8]);
    let mut m = MultiField::new(global, 4, 1, 0.0);
    let mut rng = StdRng::seed_from_u64(8);
    for c in global.coord_iter() {
        m.set(&c, rng.gen_range(0.0..1.0));
    }
    assert_eq!(m.num_blocks(), 12);
    let single = m.gather(0.0);
    let comm = SerialCommunicator::new();

    let r = m.reduce(CellReduction::new(|v: &f64| *v), &global, &comm);
    assert_eq!(r.count(), global.buffer_size() as i64);
    assert_approx_eq!(
        f64,
        r.sum(),
        compute_sum(&single, &single.bounding_box()),
        epsilon = 1e-10
    );
    assert_eq!(r.max(), compute_max(&single, &single.bounding_box()));

    let sub = AABB::new(matrix![3, 9; 0, 5]);
    let r = m.reduce(CellReduction::new(|v: &f64| *v), &sub, &comm);
    let local_sub = sub.shift(&-single.location());
    assert_eq!(r.count(), 42);
    assert_approx_eq!(
        f64,
        r.sum(),
        compute_sum(&single, &local_sub),
        epsilon = 1e-10
    );
}

#[test]
fn multi_block_bounded_sum_test() {
    let global = AABB::new(matrix![0, 9; 0, 6]);
    let mut m = MultiField::new(global, 3, 1, 0.0);
    for c in global.coord_iter() {
        m.set(&c, (c[0] + 2 * c[1]) as f64);
    }
    let single = m.gather(0.0);
    let comm = SerialCommunicator::new();
    let r = m.reduce_bounded(BoundedSum::new(), &global, &comm);
    assert_approx_eq!(
        f64,
        r.sum(),
        compute_bounded_sum(&single, &single.bounding_box()),
        epsilon = 1e-9
    );
    // Trapezoid weights of a 10x7 box: 9 * 6 unit squares.
    assert_approx_eq!(f64, r.weight(), 54.0, epsilon = 1e-12);
}

#[test]
fn norm_and_sum_example_test() {
    let scalars = ScalarField::new(vector![4, 4], 2.0);
    assert_eq!(compute_sum(&scalars, &scalars.bounding_box()), 32.0);

    let tensors = TensorField::<2, 2>::new(vector![4, 4], Tensor::<2>::new(3.0, 4.0));
    let norms = compute_norm(&tensors);
    assert_eq!(norms.shape(), vector![4, 4]);
    for v in norms.buffer() {
        assert_approx_eq!(f64, *v, 5.0, ulps = 2);
    }
}

#[test]
#[should_panic(expected = "evaluate")]
fn read_before_evaluate_test() {
    let f = ScalarField::new(vector![2, 2], 1.0);
    let partial = accumulate(CellReduction::new(|v: &f64| *v), f.bounding_box(), &f);
    partial.sum();
}

#[test]
#[should_panic(expected = "statistics gathered after evaluation")]
fn gather_after_evaluate_test() {
    let mut stats = StatisticsRegistry::new();
    let id = stats.subscribe_sum();
    stats.gather_sum(id, 1.0);
    stats.evaluate();
    stats.gather_sum(id, 100.0);
}

#[test]
fn gather_after_reset_test() {
    let mut stats = StatisticsRegistry::new();
    let id = stats.subscribe_max();
    stats.gather_max(id, 3.0);
    stats.evaluate();
    assert_eq!(stats.max(id), 3.0);
    stats.reset();
    stats.gather_max(id, -1.0);
    stats.evaluate();
    assert_eq!(stats.max(id), -1.0);
}

/// Sum of `a * b`.
#[derive(Clone)]
struct Dot {
    statistics: StatisticsRegistry,
    sum: SumId,
}

impl Dot {
    fn new() -> Self {
        let mut statistics = StatisticsRegistry::new();
        let sum = statistics.subscribe_sum();
        Dot { statistics, sum }
    }

    fn value(&self) -> f64 {
        self.statistics.sum(self.sum)
    }
}

impl Functional for Dot {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl Reductive for Dot {
    fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry {
        &mut self.statistics
    }
}

impl BoxFunctional2<f64, f64, 2> for Dot {
    fn process(
        &mut self,
        domain: &AABB<2>,
        a: &mut Operand<'_, f64, 2>,
        b: &mut Operand<'_, f64, 2>,
    ) {
        for c in domain.coord_iter() {
            self.statistics.gather_sum(self.sum, a.get(&c) * b.get(&c));
        }
    }
}

#[test]
fn reduce2_test() {
    let a = ScalarField::from_fn(vector![3, 4], 0.0, |c| c[0] as f64);
    let b = ScalarField::from_fn(vector![3, 4], 0.0, |c| c[1] as f64);
    let r = reduce2(Dot::new(), a.bounding_box(), &a, &b);
    assert_eq!(r.value(), 18.0);

    // b shifted one cell right: only a's columns 1 and 2 overlap it.
    let shifted = b.clone().with_location(vector![1, 0]);
    let r = reduce2(Dot::new(), a.bounding_box(), &a, &shifted);
    assert_eq!(r.value(), 18.0);
}

#[test]
fn accumulate2_merge_test() {
    let a = random_field(vector![7, 5], 2);
    let b = random_field(vector![7, 5], 3);
    let whole = reduce2(Dot::new(), a.bounding_box(), &a, &b);

    let left = accumulate2(Dot::new(), AABB::new(matrix![0, 2; 0, 4]), &a, &b);
    let mut merged = accumulate2(Dot::new(), AABB::new(matrix![3, 6; 0, 4]), &a, &b);
    merged.statistics_mut().merge(left.statistics());
    merged.statistics_mut().evaluate();
    assert_approx_eq!(f64, merged.value(), whole.value(), epsilon = 1e-10);
}

/// Smallest and largest cell-wise sum over all operands.
struct SumRange {
    statistics: StatisticsRegistry,
    min: MinId,
    max: MaxId,
}

impl SumRange {
    fn new() -> Self {
        let mut statistics = StatisticsRegistry::new();
        let min = statistics.subscribe_min();
        let max = statistics.subscribe_max();
        SumRange {
            statistics,
            min,
            max,
        }
    }
}

impl Functional for SumRange {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl Reductive for SumRange {
    fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry {
        &mut self.statistics
    }
}

impl BoxFunctionalN<f64, 2> for SumRange {
    fn process(&mut self, domain: &AABB<2>, fields: &mut [Operand<'_, f64, 2>]) {
        for c in domain.coord_iter() {
            let s: f64 = fields.iter().map(|f| *f.get(&c)).sum();
            self.statistics.gather_min(self.min, s);
            self.statistics.gather_max(self.max, s);
        }
    }
}

#[test]
fn reduce_n_test() {
    let fields: Vec<_> = (0..3).map(|i| random_field(vector![6, 6], 40 + i)).collect();
    let refs: Vec<&ScalarField<2>> = fields.iter().collect();
    let domain = AABB::new(matrix![1, 4; 0, 5]);
    let r = reduce_n(SumRange::new(), domain, &refs);

    let sums: Vec<f64> = domain
        .coord_iter()
        .map(|c| fields.iter().map(|f| *f.get(&c)).sum())
        .collect();
    let min = sums.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = sums.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(r.statistics().min(r.min), min);
    assert_eq!(r.statistics().max(r.max), max);
}
