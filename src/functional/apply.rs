//! The dispatcher: the one place functionals get executed.
//!
//! Every entry point consumes the functional, clips the requested domain
//! against what the operands can serve, computes the offset between the
//! first operand and every other operand once, and runs the functional.
//! Mutating entry points (`apply*`) return an `Application` describing
//! which operands became stale. Reductive entry points (`reduce*`) only
//! hand out read-only operands, evaluate the functional's statistics and
//! return the functional for read-back; `accumulate*` does the same
//! without evaluating, for callers that still have partial results of
//! other sub-domains to merge in.
//!
//! Cells are visited in row-major order within each processed box.

use super::*;

/// Part of a written operand that has to be treated as out of date by
/// the block-management layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification<const GRID_DIMENSION: usize> {
    pub operand: usize,
    /// In the operand's own coordinates.
    pub stale: AABB<GRID_DIMENSION>,
    /// Only the bulk was written, the envelope must be refreshed from the
    /// neighbouring blocks.
    pub needs_envelope_update: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application<const GRID_DIMENSION: usize> {
    /// Boxes the functional actually ran on, in the coordinates of the
    /// first operand. Empty when the domain did not meet the operands.
    pub processed: Vec<AABB<GRID_DIMENSION>>,
    pub modified: Vec<Modification<GRID_DIMENSION>>,
}

impl<const GRID_DIMENSION: usize> Application<GRID_DIMENSION> {
    pub fn is_noop(&self) -> bool {
        self.processed.is_empty()
    }

    pub fn is_modified(&self, operand: usize) -> bool {
        self.modified.iter().any(|m| m.operand == operand)
    }
}

/// Valid ranges of one operand in the caller's coordinates.
struct Extent<const GRID_DIMENSION: usize> {
    full: AABB<GRID_DIMENSION>,
    bulk: AABB<GRID_DIMENSION>,
    envelope_width: i32,
}

impl<const GRID_DIMENSION: usize> Extent<GRID_DIMENSION> {
    fn of<T: Clone + Send + Sync>(op: &Operand<'_, T, GRID_DIMENSION>) -> Self {
        Extent {
            full: op.bounding_box(),
            bulk: op.bulk(),
            envelope_width: op.field().envelope_width(),
        }
    }
}

/// Boxes to run on: `domain` clipped against every operand. For
/// functionals acting on the envelope only, the bulk of the first operand
/// is cut out, which can leave several boxes.
fn execution_domains<const GRID_DIMENSION: usize>(
    domain: &AABB<GRID_DIMENSION>,
    applies_to: AppliesTo,
    extents: &[Extent<GRID_DIMENSION>],
) -> Vec<AABB<GRID_DIMENSION>> {
    let mut clipped = Some(*domain);
    for e in extents {
        let limit = match applies_to {
            AppliesTo::Bulk => &e.bulk,
            AppliesTo::Envelope | AppliesTo::BulkAndEnvelope => &e.full,
        };
        clipped = clipped.and_then(|c| c.intersection(limit));
    }
    let Some(clipped) = clipped else {
        return Vec::new();
    };
    match applies_to {
        AppliesTo::Envelope => {
            let first = &extents[0];
            Surface::new(first.full, first.envelope_width)
                .regions()
                .into_iter()
                .filter(|(region, _)| *region != Region::Bulk)
                .filter_map(|(_, b)| b.intersection(&clipped))
                .collect()
        }
        _ => vec![clipped],
    }
}

fn bookkeeping<const GRID_DIMENSION: usize>(
    applies_to: AppliesTo,
    pattern: &[bool],
    own_boxes: &[(AABB<GRID_DIMENSION>, AABB<GRID_DIMENSION>)],
    processed: Vec<AABB<GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION> {
    let modified = if processed.is_empty() {
        Vec::new()
    } else {
        pattern
            .iter()
            .zip(own_boxes)
            .enumerate()
            .filter(|(_, (written, _))| **written)
            .map(|(operand, (_, (full, bulk)))| Modification {
                operand,
                stale: if applies_to == AppliesTo::Bulk {
                    *bulk
                } else {
                    *full
                },
                needs_envelope_update: applies_to == AppliesTo::Bulk,
            })
            .collect()
    };
    Application {
        processed,
        modified,
    }
}

fn own_boxes<T: Clone + Send + Sync, const GRID_DIMENSION: usize>(
    op: &Operand<'_, T, GRID_DIMENSION>,
) -> (AABB<GRID_DIMENSION>, AABB<GRID_DIMENSION>) {
    (op.field().bounding_box(), op.field().bulk())
}

#[track_caller]
fn assert_read_only<F: Functional + ?Sized>(functional: &F, n: usize) {
    assert!(
        functional.modification_pattern(n).iter().all(|m| !m),
        "reductive functionals must not modify their operands"
    );
}

/// Split `domain` along the surface of `reference` and hand each
/// non-empty piece to `f`. Parts of `domain` outside `reference`, such as
/// envelope cells, go to the face, edge or corner they lie beyond, so
/// every cell of `domain` is handed out exactly once.
fn for_each_region<const GRID_DIMENSION: usize, F>(
    domain: &AABB<GRID_DIMENSION>,
    reference: &AABB<GRID_DIMENSION>,
    width: i32,
    mut f: F,
) where
    F: FnMut(Region<GRID_DIMENSION>, &AABB<GRID_DIMENSION>),
{
    let surface = Surface::new(*reference, width);
    for (region, region_box) in surface.regions_covering(domain) {
        if let Some(piece) = region_box.intersection(domain) {
            f(region, &piece);
        }
    }
}

fn two_operands<'a, 'b, T, U, const GRID_DIMENSION: usize>(
    pattern: &[bool],
    a: FieldRef<'a, T, GRID_DIMENSION>,
    b: FieldRef<'b, U, GRID_DIMENSION>,
) -> (Operand<'a, T, GRID_DIMENSION>, Operand<'b, U, GRID_DIMENSION>)
where
    T: Clone + Send + Sync,
    U: Clone + Send + Sync,
{
    let shift = relative_offset(a.field(), b.field());
    (
        Operand::from_ref(a, 0, pattern[0], Coord::zero()),
        Operand::from_ref(b, 1, pattern[1], shift),
    )
}

fn n_operands<'a, T, const GRID_DIMENSION: usize>(
    pattern: &[bool],
    fields: Vec<FieldRef<'a, T, GRID_DIMENSION>>,
) -> Vec<Operand<'a, T, GRID_DIMENSION>>
where
    T: Clone + Send + Sync,
{
    assert!(!fields.is_empty(), "functional applied to no operands");
    let shifts: Vec<Coord<GRID_DIMENSION>> = fields
        .iter()
        .map(|f| relative_offset(fields[0].field(), f.field()))
        .collect();
    fields
        .into_iter()
        .zip(shifts)
        .enumerate()
        .map(|(i, (f, shift))| Operand::from_ref(f, i, pattern[i], shift))
        .collect()
}

fn read_operands<'a, T, const GRID_DIMENSION: usize>(
    fields: &[&'a Field<T, GRID_DIMENSION>],
) -> Vec<Operand<'a, T, GRID_DIMENSION>>
where
    T: Clone + Send + Sync,
{
    assert!(!fields.is_empty(), "functional applied to no operands");
    fields
        .iter()
        .map(|f| Operand::read(f, relative_offset(fields[0], *f)))
        .collect()
}

fn dispatch_bounded<T, F, const GRID_DIMENSION: usize>(
    functional: &mut F,
    domain: &AABB<GRID_DIMENSION>,
    reference: &AABB<GRID_DIMENSION>,
    op: &mut Operand<'_, T, GRID_DIMENSION>,
) where
    T: Clone + Send + Sync,
    F: BoundedFunctional<T, GRID_DIMENSION> + ?Sized,
{
    let width = functional.boundary_width();
    for_each_region(domain, reference, width, |region, piece| match region {
        Region::Bulk => functional.process_bulk(piece, op),
        Region::Face {
            direction,
            orientation,
        } => functional.process_face(direction, orientation, piece, op),
        Region::Edge { plane, normal } => {
            functional.process_edge(plane, &normal, piece, op)
        }
        Region::Corner { normal } => {
            functional.process_corner(&normal, piece, op)
        }
    });
}

fn dispatch_bounded2<T, U, F, const GRID_DIMENSION: usize>(
    functional: &mut F,
    domain: &AABB<GRID_DIMENSION>,
    reference: &AABB<GRID_DIMENSION>,
    a: &mut Operand<'_, T, GRID_DIMENSION>,
    b: &mut Operand<'_, U, GRID_DIMENSION>,
) where
    T: Clone + Send + Sync,
    U: Clone + Send + Sync,
    F: BoundedFunctional2<T, U, GRID_DIMENSION> + ?Sized,
{
    let width = functional.boundary_width();
    for_each_region(domain, reference, width, |region, piece| match region {
        Region::Bulk => functional.process_bulk(piece, a, b),
        Region::Face {
            direction,
            orientation,
        } => functional.process_face(direction, orientation, piece, a, b),
        Region::Edge { plane, normal } => {
            functional.process_edge(plane, &normal, piece, a, b)
        }
        Region::Corner { normal } => {
            functional.process_corner(&normal, piece, a, b)
        }
    });
}

fn dispatch_bounded_n<T, F, const GRID_DIMENSION: usize>(
    functional: &mut F,
    domain: &AABB<GRID_DIMENSION>,
    reference: &AABB<GRID_DIMENSION>,
    ops: &mut [Operand<'_, T, GRID_DIMENSION>],
) where
    T: Clone + Send + Sync,
    F: BoundedFunctionalN<T, GRID_DIMENSION> + ?Sized,
{
    let width = functional.boundary_width();
    for_each_region(domain, reference, width, |region, piece| match region {
        Region::Bulk => functional.process_bulk(piece, ops),
        Region::Face {
            direction,
            orientation,
        } => functional.process_face(direction, orientation, piece, ops),
        Region::Edge { plane, normal } => {
            functional.process_edge(plane, &normal, piece, ops)
        }
        Region::Corner { normal } => {
            functional.process_corner(&normal, piece, ops)
        }
    });
}

/// Run `functional` on one field.
pub fn apply<'a, T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    field: impl Into<FieldRef<'a, T, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    F: BoxFunctional<T, GRID_DIMENSION>,
{
    profiling::scope!("functional::apply");
    let pattern = functional.modification_pattern(1);
    let mut op = Operand::from_ref(field.into(), 0, pattern[0], Coord::zero());
    let applies_to = functional.applies_to();
    let domains = execution_domains(&domain, applies_to, &[Extent::of(&op)]);
    for d in &domains {
        functional.process(d, &mut op);
    }
    bookkeeping(applies_to, &pattern, &[own_boxes(&op)], domains)
}

/// Run `functional` on two fields, `b` addressed through its offset
/// from `a`.
pub fn apply2<'a, 'b, T, U, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    a: impl Into<FieldRef<'a, T, GRID_DIMENSION>>,
    b: impl Into<FieldRef<'b, U, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    U: Clone + Send + Sync + 'b,
    F: BoxFunctional2<T, U, GRID_DIMENSION>,
{
    profiling::scope!("functional::apply2");
    let pattern = functional.modification_pattern(2);
    let (mut a, mut b) = two_operands(&pattern, a.into(), b.into());
    let applies_to = functional.applies_to();
    let domains = execution_domains(
        &domain,
        applies_to,
        &[Extent::of(&a), Extent::of(&b)],
    );
    for d in &domains {
        functional.process(d, &mut a, &mut b);
    }
    bookkeeping(
        applies_to,
        &pattern,
        &[own_boxes(&a), own_boxes(&b)],
        domains,
    )
}

/// Run `functional` on a list of fields, all addressed through their
/// offset from the first one.
pub fn apply_n<'a, T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    fields: Vec<FieldRef<'a, T, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    F: BoxFunctionalN<T, GRID_DIMENSION>,
{
    profiling::scope!("functional::apply_n");
    let pattern = functional.modification_pattern(fields.len());
    let mut ops = n_operands(&pattern, fields);
    let applies_to = functional.applies_to();
    let extents: Vec<_> = ops.iter().map(Extent::of).collect();
    let domains = execution_domains(&domain, applies_to, &extents);
    for d in &domains {
        functional.process(d, &mut ops);
    }
    let own: Vec<_> = ops.iter().map(own_boxes).collect();
    bookkeeping(applies_to, &pattern, &own, domains)
}

/// Run a boundary-aware functional on one field. Which hook handles a
/// cell depends only on where the cell sits in the bulk of the field.
pub fn apply_bounded<'a, T, F, const GRID_DIMENSION: usize>(
    functional: F,
    domain: AABB<GRID_DIMENSION>,
    field: impl Into<FieldRef<'a, T, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    F: BoundedFunctional<T, GRID_DIMENSION>,
{
    let field = field.into();
    let reference = field.field().bulk();
    apply_bounded_within(functional, domain, reference, field)
}

/// Like `apply_bounded`, with the block whose surface decides the hooks
/// given explicitly, in the coordinates of the field.
pub fn apply_bounded_within<'a, T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    reference: AABB<GRID_DIMENSION>,
    field: impl Into<FieldRef<'a, T, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    F: BoundedFunctional<T, GRID_DIMENSION>,
{
    profiling::scope!("functional::apply_bounded");
    let pattern = functional.modification_pattern(1);
    let mut op = Operand::from_ref(field.into(), 0, pattern[0], Coord::zero());
    let applies_to = functional.applies_to();
    let domains = execution_domains(&domain, applies_to, &[Extent::of(&op)]);
    for d in &domains {
        dispatch_bounded(&mut functional, d, &reference, &mut op);
    }
    bookkeeping(applies_to, &pattern, &[own_boxes(&op)], domains)
}

pub fn apply_bounded2<'a, 'b, T, U, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    a: impl Into<FieldRef<'a, T, GRID_DIMENSION>>,
    b: impl Into<FieldRef<'b, U, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    U: Clone + Send + Sync + 'b,
    F: BoundedFunctional2<T, U, GRID_DIMENSION>,
{
    profiling::scope!("functional::apply_bounded2");
    let pattern = functional.modification_pattern(2);
    let (mut a, mut b) = two_operands(&pattern, a.into(), b.into());
    let reference = a.field().bulk();
    let applies_to = functional.applies_to();
    let domains = execution_domains(
        &domain,
        applies_to,
        &[Extent::of(&a), Extent::of(&b)],
    );
    for d in &domains {
        dispatch_bounded2(&mut functional, d, &reference, &mut a, &mut b);
    }
    bookkeeping(
        applies_to,
        &pattern,
        &[own_boxes(&a), own_boxes(&b)],
        domains,
    )
}

pub fn apply_bounded_n<'a, T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    fields: Vec<FieldRef<'a, T, GRID_DIMENSION>>,
) -> Application<GRID_DIMENSION>
where
    T: Clone + Send + Sync + 'a,
    F: BoundedFunctionalN<T, GRID_DIMENSION>,
{
    profiling::scope!("functional::apply_bounded_n");
    let pattern = functional.modification_pattern(fields.len());
    let mut ops = n_operands(&pattern, fields);
    let reference = ops[0].field().bulk();
    let applies_to = functional.applies_to();
    let extents: Vec<_> = ops.iter().map(Extent::of).collect();
    let domains = execution_domains(&domain, applies_to, &extents);
    for d in &domains {
        dispatch_bounded_n(&mut functional, d, &reference, &mut ops);
    }
    let own: Vec<_> = ops.iter().map(own_boxes).collect();
    bookkeeping(applies_to, &pattern, &own, domains)
}

/// Gather the statistics of `functional` over `field` without
/// evaluating them.
pub fn accumulate<T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    field: &Field<T, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    F: BoxFunctional<T, GRID_DIMENSION> + Reductive,
{
    profiling::scope!("functional::accumulate");
    assert_read_only(&functional, 1);
    let mut op = Operand::read(field, Coord::zero());
    let applies_to = functional.applies_to();
    for d in execution_domains(&domain, applies_to, &[Extent::of(&op)]) {
        functional.process(&d, &mut op);
    }
    functional
}

/// Run a reductive functional on one field and evaluate its statistics.
pub fn reduce<T, F, const GRID_DIMENSION: usize>(
    functional: F,
    domain: AABB<GRID_DIMENSION>,
    field: &Field<T, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    F: BoxFunctional<T, GRID_DIMENSION> + Reductive,
{
    let mut functional = accumulate(functional, domain, field);
    functional.statistics_mut().evaluate();
    functional
}

pub fn accumulate2<T, U, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<U, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    U: Clone + Send + Sync,
    F: BoxFunctional2<T, U, GRID_DIMENSION> + Reductive,
{
    profiling::scope!("functional::accumulate2");
    assert_read_only(&functional, 2);
    let mut a_op = Operand::read(a, Coord::zero());
    let mut b_op = Operand::read(b, relative_offset(a, b));
    let applies_to = functional.applies_to();
    let extents = [Extent::of(&a_op), Extent::of(&b_op)];
    for d in execution_domains(&domain, applies_to, &extents) {
        functional.process(&d, &mut a_op, &mut b_op);
    }
    functional
}

pub fn reduce2<T, U, F, const GRID_DIMENSION: usize>(
    functional: F,
    domain: AABB<GRID_DIMENSION>,
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<U, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    U: Clone + Send + Sync,
    F: BoxFunctional2<T, U, GRID_DIMENSION> + Reductive,
{
    let mut functional = accumulate2(functional, domain, a, b);
    functional.statistics_mut().evaluate();
    functional
}

pub fn reduce_n<T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    fields: &[&Field<T, GRID_DIMENSION>],
) -> F
where
    T: Clone + Send + Sync,
    F: BoxFunctionalN<T, GRID_DIMENSION> + Reductive,
{
    profiling::scope!("functional::reduce_n");
    assert_read_only(&functional, fields.len());
    let mut ops = read_operands(fields);
    let applies_to = functional.applies_to();
    let extents: Vec<_> = ops.iter().map(Extent::of).collect();
    for d in execution_domains(&domain, applies_to, &extents) {
        functional.process(&d, &mut ops);
    }
    functional.statistics_mut().evaluate();
    functional
}

pub fn accumulate_bounded_within<T, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    reference: AABB<GRID_DIMENSION>,
    field: &Field<T, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    F: BoundedFunctional<T, GRID_DIMENSION> + Reductive,
{
    profiling::scope!("functional::accumulate_bounded");
    assert_read_only(&functional, 1);
    let mut op = Operand::read(field, Coord::zero());
    let applies_to = functional.applies_to();
    for d in execution_domains(&domain, applies_to, &[Extent::of(&op)]) {
        dispatch_bounded(&mut functional, &d, &reference, &mut op);
    }
    functional
}

pub fn reduce_bounded<T, F, const GRID_DIMENSION: usize>(
    functional: F,
    domain: AABB<GRID_DIMENSION>,
    field: &Field<T, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    F: BoundedFunctional<T, GRID_DIMENSION> + Reductive,
{
    let mut functional =
        accumulate_bounded_within(functional, domain, field.bulk(), field);
    functional.statistics_mut().evaluate();
    functional
}

pub fn reduce_bounded2<T, U, F, const GRID_DIMENSION: usize>(
    mut functional: F,
    domain: AABB<GRID_DIMENSION>,
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<U, GRID_DIMENSION>,
) -> F
where
    T: Clone + Send + Sync,
    U: Clone + Send + Sync,
    F: BoundedFunctional2<T, U, GRID_DIMENSION> + Reductive,
{
    profiling::scope!("functional::reduce_bounded2");
    assert_read_only(&functional, 2);
    let mut a_op = Operand::read(a, Coord::zero());
    let mut b_op = Operand::read(b, relative_offset(a, b));
    let reference = a.bulk();
    let applies_to = functional.applies_to();
    let extents = [Extent::of(&a_op), Extent::of(&b_op)];
    for d in execution_domains(&domain, applies_to, &extents) {
        dispatch_bounded2(&mut functional, &d, &reference, &mut a_op, &mut b_op);
    }
    functional.statistics_mut().evaluate();
    functional
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Writes the operand's own coordinate sum into every cell.
    struct Fill;

    impl Functional for Fill {
        fn modifies(&self, _operand: usize) -> bool {
            true
        }
    }

    impl BoxFunctional<f64, 2> for Fill {
        fn process(
            &mut self,
            domain: &AABB<2>,
            field: &mut Operand<'_, f64, 2>,
        ) {
            for c in domain.coord_iter() {
                field.set(&c, (c[0] + c[1]) as f64);
            }
        }
    }

    /// Copies `a` into `b`.
    struct CopyInto;

    impl Functional for CopyInto {
        fn modifies(&self, operand: usize) -> bool {
            operand == 1
        }
    }

    impl BoxFunctional2<f64, f64, 2> for CopyInto {
        fn process(
            &mut self,
            domain: &AABB<2>,
            a: &mut Operand<'_, f64, 2>,
            b: &mut Operand<'_, f64, 2>,
        ) {
            for c in domain.coord_iter() {
                b.set(&c, *a.get(&c));
            }
        }
    }

    #[test]
    fn clip_test() {
        let mut f = ScalarField::new(vector![4, 4], -1.0);
        let report = apply(Fill, AABB::new(matrix![2, 9; -3, 1]), &mut f);
        assert_eq!(report.processed, vec![AABB::new(matrix![2, 3; 0, 1])]);
        assert!(report.is_modified(0));
        for c in f.bounding_box().coord_iter() {
            let expected = if c[0] >= 2 && c[1] <= 1 {
                (c[0] + c[1]) as f64
            } else {
                -1.0
            };
            assert_eq!(*f.get(&c), expected);
        }
    }

    #[test]
    fn empty_domain_is_noop_test() {
        let mut f = ScalarField::new(vector![4, 4], -1.0);
        let report = apply(Fill, AABB::new(matrix![5, 9; 0, 3]), &mut f);
        assert!(report.is_noop());
        assert!(report.modified.is_empty());
        assert!(f.buffer().iter().all(|v| *v == -1.0));
    }

    #[test]
    fn offset_between_operands_test() {
        // b sits two cells right of a in the global domain.
        let a = ScalarField::from_fn(vector![4, 4], 0.0, |c| {
            (10 * c[0] + c[1]) as f64
        });
        let mut b = ScalarField::new(vector![4, 4], 0.0).with_location(vector![2, 0]);
        let report = apply2(CopyInto, a.bounding_box(), &a, &mut b);
        // Only the overlap, a's columns 2 and 3, is processed.
        assert_eq!(report.processed, vec![AABB::new(matrix![2, 3; 0, 3])]);
        assert_eq!(*b.get(&vector![0, 1]), 21.0);
        assert_eq!(*b.get(&vector![1, 3]), 33.0);
        assert_eq!(*b.get(&vector![2, 0]), 0.0);
        assert!(!report.is_modified(0));
        assert!(report.is_modified(1));
    }

    #[test]
    fn envelope_only_test() {
        let mut f = ScalarField::new(vector![5, 5], -1.0).with_envelope(1);

        struct OnEnvelope;
        impl Functional for OnEnvelope {
            fn modifies(&self, _operand: usize) -> bool {
                true
            }
            fn applies_to(&self) -> AppliesTo {
                AppliesTo::Envelope
            }
        }
        impl BoxFunctional<f64, 2> for OnEnvelope {
            fn process(
                &mut self,
                domain: &AABB<2>,
                field: &mut Operand<'_, f64, 2>,
            ) {
                for c in domain.coord_iter() {
                    field.set(&c, 1.0);
                }
            }
        }

        let report = apply(OnEnvelope, f.bounding_box(), &mut f);
        assert_eq!(report.processed.len(), 8);
        assert_eq!(report.modified[0].stale, f.bounding_box());
        assert!(!report.modified[0].needs_envelope_update);
        for c in f.bounding_box().coord_iter() {
            let expected = if f.bulk().contains(&c) { -1.0 } else { 1.0 };
            assert_eq!(*f.get(&c), expected);
        }
    }

    #[test]
    fn bulk_only_stale_test() {
        let mut f = ScalarField::new(vector![6, 6], 0.0).with_envelope(1);
        let report = apply(Fill, f.bounding_box(), &mut f);
        assert_eq!(report.processed, vec![f.bulk()]);
        assert_eq!(report.modified[0].stale, f.bulk());
        assert!(report.modified[0].needs_envelope_update);
        assert_eq!(*f.get(&vector![0, 3]), 0.0);
    }
}
