use latblock::field::*;
use latblock::functional::*;
use latblock::statistics::*;
use latblock::util::*;

/// Stamps each cell with the hook that handled it: 1 for the bulk,
/// `10 + direction` on faces, `100 + plane` on edges, 1000 on corners.
struct Tag {
    applies_to: AppliesTo,
}

impl Functional for Tag {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }

    fn applies_to(&self) -> AppliesTo {
        self.applies_to
    }
}

fn stamp<const D: usize>(domain: &AABB<D>, field: &mut Operand<'_, i64, D>, value: i64) {
    for c in domain.coord_iter() {
        assert_eq!(*field.get(&c), 0, "{:?} visited twice", c);
        field.set(&c, value);
    }
}

impl<const D: usize> BoundedFunctional<i64, D> for Tag {
    fn process_bulk(&mut self, domain: &AABB<D>, field: &mut Operand<'_, i64, D>) {
        stamp(domain, field, 1);
    }

    fn process_face(
        &mut self,
        direction: usize,
        _orientation: Orientation,
        domain: &AABB<D>,
        field: &mut Operand<'_, i64, D>,
    ) {
        stamp(domain, field, 10 + direction as i64);
    }

    fn process_edge(
        &mut self,
        plane: usize,
        normal: &Coord<D>,
        domain: &AABB<D>,
        field: &mut Operand<'_, i64, D>,
    ) {
        assert_eq!(normal[plane], 0);
        stamp(domain, field, 100 + plane as i64);
    }

    fn process_corner(
        &mut self,
        normal: &Coord<D>,
        domain: &AABB<D>,
        field: &mut Operand<'_, i64, D>,
    ) {
        assert!(normal.iter().all(|n| *n != 0));
        stamp(domain, field, 1000);
    }
}

fn tally<const D: usize>(field: &Field<i64, D>, value: i64) -> usize {
    field.buffer().iter().filter(|v| **v == value).count()
}

#[test]
fn envelope_cells_reach_hooks_test() {
    let mut f = Field::new(vector![6, 6], 0i64).with_envelope(1);
    let report = apply_bounded(
        Tag {
            applies_to: AppliesTo::BulkAndEnvelope,
        },
        f.bounding_box(),
        &mut f,
    );
    assert_eq!(report.processed, vec![f.bounding_box()]);
    assert_eq!(report.modified[0].stale, f.bounding_box());
    assert!(f.buffer().iter().all(|v| *v != 0));

    // Envelope cells belong to the face or corner of the bulk they lie
    // beyond.
    assert_eq!(*f.get(&vector![0, 0]), 1000);
    assert_eq!(*f.get(&vector![1, 1]), 1000);
    assert_eq!(*f.get(&vector![0, 2]), 10);
    assert_eq!(*f.get(&vector![5, 3]), 10);
    assert_eq!(*f.get(&vector![3, 0]), 11);
    assert_eq!(*f.get(&vector![2, 2]), 1);
    assert_eq!(tally(&f, 1), 4);
    assert_eq!(tally(&f, 1000), 16);
}

#[test]
fn envelope_only_bounded_test() {
    let mut f = Field::new(vector![6, 6], 0i64).with_envelope(1);
    let report = apply_bounded(
        Tag {
            applies_to: AppliesTo::Envelope,
        },
        f.bounding_box(),
        &mut f,
    );
    assert!(!report.is_noop());
    for c in f.bounding_box().coord_iter() {
        assert_eq!(*f.get(&c) == 0, f.bulk().contains(&c));
    }
    assert_eq!(tally(&f, 1000), 12);
}

#[test]
fn hooks_in_3d_test() {
    let mut f = Field::new(vector![5, 5, 5], 0i64);
    apply_bounded(
        Tag {
            applies_to: AppliesTo::Bulk,
        },
        f.bounding_box(),
        &mut f,
    );
    assert_eq!(tally(&f, 1), 27);
    assert_eq!(tally(&f, 10) + tally(&f, 11) + tally(&f, 12), 54);
    assert_eq!(tally(&f, 100) + tally(&f, 101) + tally(&f, 102), 36);
    assert_eq!(tally(&f, 1000), 8);

    assert_eq!(*f.get(&vector![2, 2, 2]), 1);
    assert_eq!(*f.get(&vector![0, 2, 2]), 10);
    assert_eq!(*f.get(&vector![2, 4, 2]), 11);
    assert_eq!(*f.get(&vector![2, 2, 0]), 12);
    // An edge runs along the axis its normal leaves at zero.
    assert_eq!(*f.get(&vector![0, 0, 2]), 102);
    assert_eq!(*f.get(&vector![0, 2, 4]), 101);
    assert_eq!(*f.get(&vector![2, 4, 4]), 100);
    assert_eq!(*f.get(&vector![4, 4, 4]), 1000);
}

/// Writes `a + b` into the last operand in the bulk, `a` on faces and
/// `b` on corners.
struct SplitSum;

impl Functional for SplitSum {
    fn modifies(&self, operand: usize) -> bool {
        operand == 2
    }
}

impl BoundedFunctionalN<f64, 2> for SplitSum {
    fn process_bulk(&mut self, domain: &AABB<2>, fields: &mut [Operand<'_, f64, 2>]) {
        for c in domain.coord_iter() {
            let v = *fields[0].get(&c) + *fields[1].get(&c);
            fields[2].set(&c, v);
        }
    }

    fn process_face(
        &mut self,
        _direction: usize,
        _orientation: Orientation,
        domain: &AABB<2>,
        fields: &mut [Operand<'_, f64, 2>],
    ) {
        for c in domain.coord_iter() {
            let v = *fields[0].get(&c);
            fields[2].set(&c, v);
        }
    }

    fn process_corner(
        &mut self,
        _normal: &Coord<2>,
        domain: &AABB<2>,
        fields: &mut [Operand<'_, f64, 2>],
    ) {
        for c in domain.coord_iter() {
            let v = *fields[1].get(&c);
            fields[2].set(&c, v);
        }
    }
}

#[test]
fn bounded_n_test() {
    let a = ScalarField::new(vector![5, 5], 1.0);
    let b = ScalarField::new(vector![5, 5], 2.0);
    let mut out = ScalarField::new(vector![5, 5], 0.0);
    let domain = out.bounding_box();
    let report = apply_bounded_n(
        SplitSum,
        domain,
        vec![(&a).into(), (&b).into(), (&mut out).into()],
    );
    assert!(!report.is_modified(0));
    assert!(!report.is_modified(1));
    assert!(report.is_modified(2));
    assert_eq!(*out.get(&vector![2, 2]), 3.0);
    assert_eq!(*out.get(&vector![3, 1]), 3.0);
    assert_eq!(*out.get(&vector![0, 2]), 1.0);
    assert_eq!(*out.get(&vector![2, 4]), 1.0);
    assert_eq!(*out.get(&vector![4, 0]), 2.0);
    assert_eq!(out.buffer().iter().filter(|v| **v == 3.0).count(), 9);
}

/// Sums `|a - b|` separately over the bulk and the perimeter.
struct Mismatch {
    statistics: StatisticsRegistry,
    bulk: SumId,
    perimeter: SumId,
}

impl Mismatch {
    fn new() -> Self {
        let mut statistics = StatisticsRegistry::new();
        let bulk = statistics.subscribe_sum();
        let perimeter = statistics.subscribe_sum();
        Mismatch {
            statistics,
            bulk,
            perimeter,
        }
    }

    fn gather(
        &mut self,
        id: SumId,
        domain: &AABB<2>,
        a: &Operand<'_, f64, 2>,
        b: &Operand<'_, f64, 2>,
    ) {
        for c in domain.coord_iter() {
            self.statistics.gather_sum(id, (a.get(&c) - b.get(&c)).abs());
        }
    }
}

impl Functional for Mismatch {
    fn modifies(&self, _operand: usize) -> bool {
        false
    }
}

impl Reductive for Mismatch {
    fn statistics(&self) -> &StatisticsRegistry {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut StatisticsRegistry {
        &mut self.statistics
    }
}

impl BoundedFunctional2<f64, f64, 2> for Mismatch {
    fn process_bulk(
        &mut self,
        domain: &AABB<2>,
        a: &mut Operand<'_, f64, 2>,
        b: &mut Operand<'_, f64, 2>,
    ) {
        let id = self.bulk;
        self.gather(id, domain, a, b);
    }

    fn process_face(
        &mut self,
        _direction: usize,
        _orientation: Orientation,
        domain: &AABB<2>,
        a: &mut Operand<'_, f64, 2>,
        b: &mut Operand<'_, f64, 2>,
    ) {
        let id = self.perimeter;
        self.gather(id, domain, a, b);
    }

    fn process_corner(
        &mut self,
        _normal: &Coord<2>,
        domain: &AABB<2>,
        a: &mut Operand<'_, f64, 2>,
        b: &mut Operand<'_, f64, 2>,
    ) {
        let id = self.perimeter;
        self.gather(id, domain, a, b);
    }
}

#[test]
fn reduce_bounded2_test() {
    let a = ScalarField::new(vector![5, 5], 1.0);
    let mut b = ScalarField::new(vector![5, 5], 1.0);
    b.set(&vector![0, 2], 3.0);
    b.set(&vector![4, 4], 0.5);
    b.set(&vector![2, 2], 5.0);
    let r = reduce_bounded2(Mismatch::new(), a.bounding_box(), &a, &b);
    assert_eq!(r.statistics().sum(r.bulk), 4.0);
    assert_eq!(r.statistics().sum(r.perimeter), 2.5);
}
