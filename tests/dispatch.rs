use latblock::field::*;
use latblock::functional::*;
use latblock::util::*;
use rand::prelude::*;

/// `b = 2 a + 1`, reading `a` only.
#[derive(Clone)]
struct Affine;

impl Functional for Affine {
    fn modifies(&self, operand: usize) -> bool {
        operand == 1
    }
}

impl BoxFunctional2<f64, f64, 2> for Affine {
    fn process(
        &mut self,
        domain: &AABB<2>,
        a: &mut Operand<'_, f64, 2>,
        b: &mut Operand<'_, f64, 2>,
    ) {
        for c in domain.coord_iter() {
            b.set(&c, 2.0 * a.get(&c) + 1.0);
        }
    }
}

/// Increments every cell.
#[derive(Clone)]
struct Increment;

impl Functional for Increment {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }
}

impl BoxFunctional<i64, 2> for Increment {
    fn process(&mut self, domain: &AABB<2>, field: &mut Operand<'_, i64, 2>) {
        for c in domain.coord_iter() {
            *field.get_mut(&c) += 1;
        }
    }
}

fn random_field(shape: Coord<2>, seed: u64) -> ScalarField<2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut f = ScalarField::new(shape, 0.0);
    for v in f.buffer_mut() {
        *v = rng.gen_range(-1.0..1.0);
    }
    f
}

#[test]
fn read_operand_unchanged_test() {
    let a = random_field(vector![9, 7], 3);
    let before = a.clone();
    let mut b = ScalarField::new(vector![9, 7], 0.0);
    let report = apply2(Affine, a.bounding_box(), &a, &mut b);
    assert_eq!(a, before);
    assert!(!report.is_modified(0));
    assert!(report.is_modified(1));
    for c in a.bounding_box().coord_iter() {
        assert_eq!(*b.get(&c), 2.0 * a.get(&c) + 1.0);
    }
}

#[test]
fn read_operand_passed_mutably_unchanged_test() {
    let mut a = random_field(vector![5, 5], 4);
    let before = a.clone();
    let mut b = ScalarField::new(vector![5, 5], 0.0);
    let domain = a.bounding_box();
    apply2(Affine, domain, &mut a, &mut b);
    assert_eq!(a, before);
}

#[test]
#[should_panic(expected = "passed by shared reference")]
fn written_operand_must_be_exclusive_test() {
    let a = ScalarField::new(vector![3, 3], 0.0);
    let b = ScalarField::new(vector![3, 3], 0.0);
    apply2(Affine, a.bounding_box(), &a, &b);
}

#[test]
fn deterministic_test() {
    let a = random_field(vector![16, 12], 9);
    let mut b1 = ScalarField::new(vector![16, 12], 0.0);
    let mut b2 = ScalarField::new(vector![16, 12], 0.0);
    let domain = AABB::new(matrix![2, 13; 1, 10]);
    let r1 = apply2(Affine, domain, &a, &mut b1);
    let r2 = apply2(Affine, domain, &a, &mut b2);
    assert_eq!(r1, r2);
    assert_eq!(b1, b2);
}

#[test]
fn domain_outside_operands_test() {
    let mut f = Field::new(vector![4, 4], 0i64);
    let report = apply(Increment, AABB::new(matrix![-5, -1; 0, 3]), &mut f);
    assert!(report.is_noop());
    assert!(f.buffer().iter().all(|v| *v == 0));
}

#[test]
fn generator_relocation_test() {
    let mut f = Field::new(vector![6, 6], 0i64);
    let mut generator =
        DataProcessorGenerator::new(Increment, AABB::new(matrix![0, 1; 0, 1]));
    generator.shift(&vector![3, 3]);
    assert_eq!(*generator.domain(), AABB::new(matrix![3, 4; 3, 4]));

    let part = generator
        .extract(&AABB::new(matrix![4, 9; 0, 9]))
        .expect("overlapping sub-domain");
    assert!(generator.extract(&AABB::new(matrix![0, 2; 0, 2])).is_none());

    generator.apply_to(&mut f);
    part.apply_to(&mut f);
    assert_eq!(*f.get(&vector![3, 3]), 1);
    assert_eq!(*f.get(&vector![4, 4]), 2);
    assert_eq!(f.buffer().iter().sum::<i64>(), 6);
}
