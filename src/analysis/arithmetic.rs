//! Cell-wise arithmetic between fields and scalars.
//!
//! All variants go through four functionals parameterized by an
//! `ArithmeticOp`; the public helpers only pick the operation and
//! allocate the result.

use super::*;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// `b - a`
    SubtractFrom,
    /// `b / a`
    DivideInto,
}

impl ArithmeticOp {
    #[inline]
    pub fn eval<T: NumTrait>(self, a: T, b: T) -> T {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::SubtractFrom => b - a,
            ArithmeticOp::DivideInto => b / a,
        }
    }
}

/// `result = op(field, scalar)`
#[derive(Debug, Clone)]
pub struct ScalarArithmetic<T> {
    pub op: ArithmeticOp,
    pub scalar: T,
}

impl<T: NumTrait> Functional for ScalarArithmetic<T> {
    fn modifies(&self, operand: usize) -> bool {
        operand == 1
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<T: NumTrait, const GRID_DIMENSION: usize> BoxFunctional2<T, T, GRID_DIMENSION>
    for ScalarArithmetic<T>
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
        result: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            result.set(&c, self.op.eval(*field.get(&c), self.scalar));
        }
    }
}

/// `field = op(field, scalar)`
#[derive(Debug, Clone)]
pub struct ScalarArithmeticInPlace<T> {
    pub op: ArithmeticOp,
    pub scalar: T,
}

impl<T: NumTrait> Functional for ScalarArithmeticInPlace<T> {
    fn modifies(&self, _operand: usize) -> bool {
        true
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<T: NumTrait, const GRID_DIMENSION: usize> BoxFunctional<T, GRID_DIMENSION>
    for ScalarArithmeticInPlace<T>
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            let v = field.get_mut(&c);
            *v = self.op.eval(*v, self.scalar);
        }
    }
}

/// Operands `[a, b, result]`, `result = op(a, b)`.
#[derive(Debug, Clone)]
pub struct FieldArithmetic {
    pub op: ArithmeticOp,
}

impl Functional for FieldArithmetic {
    fn modifies(&self, operand: usize) -> bool {
        operand == 2
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<T: NumTrait, const GRID_DIMENSION: usize> BoxFunctionalN<T, GRID_DIMENSION>
    for FieldArithmetic
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        fields: &mut [Operand<'_, T, GRID_DIMENSION>],
    ) {
        assert_eq!(fields.len(), 3, "field arithmetic takes [a, b, result]");
        for c in domain.coord_iter() {
            let v = self.op.eval(*fields[0].get(&c), *fields[1].get(&c));
            fields[2].set(&c, v);
        }
    }
}

/// `a = op(a, b)`
#[derive(Debug, Clone)]
pub struct FieldArithmeticInPlace {
    pub op: ArithmeticOp,
}

impl Functional for FieldArithmeticInPlace {
    fn modifies(&self, operand: usize) -> bool {
        operand == 0
    }

    fn applies_to(&self) -> AppliesTo {
        AppliesTo::BulkAndEnvelope
    }
}

impl<T: NumTrait, const GRID_DIMENSION: usize> BoxFunctional2<T, T, GRID_DIMENSION>
    for FieldArithmeticInPlace
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        a: &mut Operand<'_, T, GRID_DIMENSION>,
        b: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        for c in domain.coord_iter() {
            let rhs = *b.get(&c);
            let v = a.get_mut(&c);
            *v = self.op.eval(*v, rhs);
        }
    }
}

/// Empty field with the layout of `field`.
pub fn like<T: NumTrait, U: Clone + Send + Sync, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    value: U,
) -> Field<U, GRID_DIMENSION> {
    Field::new(field.shape(), value)
        .with_location(field.location())
        .with_envelope(field.envelope_width())
}

pub fn scalar_op<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    scalar: T,
    op: ArithmeticOp,
) -> Field<T, GRID_DIMENSION> {
    let mut result = like(field, T::zero());
    apply2(
        ScalarArithmetic { op, scalar },
        field.bounding_box(),
        field,
        &mut result,
    );
    result
}

pub fn scalar_op_in_place<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &mut Field<T, GRID_DIMENSION>,
    scalar: T,
    op: ArithmeticOp,
) {
    let domain = field.bounding_box();
    apply(ScalarArithmeticInPlace { op, scalar }, domain, field);
}

/// `op(a, b)` over the part of `a` covered by `b`; cells of the result
/// outside `b` are zero.
pub fn fields_op<T: NumTrait, const GRID_DIMENSION: usize>(
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<T, GRID_DIMENSION>,
    op: ArithmeticOp,
) -> Field<T, GRID_DIMENSION> {
    let mut result = like(a, T::zero());
    apply_n(
        FieldArithmetic { op },
        a.bounding_box(),
        vec![a.into(), b.into(), (&mut result).into()],
    );
    result
}

pub fn fields_op_in_place<T: NumTrait, const GRID_DIMENSION: usize>(
    a: &mut Field<T, GRID_DIMENSION>,
    b: &Field<T, GRID_DIMENSION>,
    op: ArithmeticOp,
) {
    let domain = a.bounding_box();
    apply2(FieldArithmeticInPlace { op }, domain, a, b);
}

pub fn add<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    scalar: T,
) -> Field<T, GRID_DIMENSION> {
    scalar_op(field, scalar, ArithmeticOp::Add)
}

pub fn subtract<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    scalar: T,
) -> Field<T, GRID_DIMENSION> {
    scalar_op(field, scalar, ArithmeticOp::Subtract)
}

/// `scalar - field`
pub fn subtract_from<T: NumTrait, const GRID_DIMENSION: usize>(
    scalar: T,
    field: &Field<T, GRID_DIMENSION>,
) -> Field<T, GRID_DIMENSION> {
    scalar_op(field, scalar, ArithmeticOp::SubtractFrom)
}

pub fn multiply<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    scalar: T,
) -> Field<T, GRID_DIMENSION> {
    scalar_op(field, scalar, ArithmeticOp::Multiply)
}

pub fn divide<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &Field<T, GRID_DIMENSION>,
    scalar: T,
) -> Field<T, GRID_DIMENSION> {
    scalar_op(field, scalar, ArithmeticOp::Divide)
}

/// `scalar / field`
pub fn divide_into<T: NumTrait, const GRID_DIMENSION: usize>(
    scalar: T,
    field: &Field<T, GRID_DIMENSION>,
) -> Field<T, GRID_DIMENSION> {
    scalar_op(field, scalar, ArithmeticOp::DivideInto)
}

pub fn add_in_place<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &mut Field<T, GRID_DIMENSION>,
    scalar: T,
) {
    scalar_op_in_place(field, scalar, ArithmeticOp::Add)
}

pub fn subtract_in_place<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &mut Field<T, GRID_DIMENSION>,
    scalar: T,
) {
    scalar_op_in_place(field, scalar, ArithmeticOp::Subtract)
}

pub fn multiply_in_place<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &mut Field<T, GRID_DIMENSION>,
    scalar: T,
) {
    scalar_op_in_place(field, scalar, ArithmeticOp::Multiply)
}

pub fn divide_in_place<T: NumTrait, const GRID_DIMENSION: usize>(
    field: &mut Field<T, GRID_DIMENSION>,
    scalar: T,
) {
    scalar_op_in_place(field, scalar, ArithmeticOp::Divide)
}

pub fn add_fields<T: NumTrait, const GRID_DIMENSION: usize>(
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<T, GRID_DIMENSION>,
) -> Field<T, GRID_DIMENSION> {
    fields_op(a, b, ArithmeticOp::Add)
}

pub fn subtract_fields<T: NumTrait, const GRID_DIMENSION: usize>(
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<T, GRID_DIMENSION>,
) -> Field<T, GRID_DIMENSION> {
    fields_op(a, b, ArithmeticOp::Subtract)
}

pub fn multiply_fields<T: NumTrait, const GRID_DIMENSION: usize>(
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<T, GRID_DIMENSION>,
) -> Field<T, GRID_DIMENSION> {
    fields_op(a, b, ArithmeticOp::Multiply)
}

pub fn divide_fields<T: NumTrait, const GRID_DIMENSION: usize>(
    a: &Field<T, GRID_DIMENSION>,
    b: &Field<T, GRID_DIMENSION>,
) -> Field<T, GRID_DIMENSION> {
    fields_op(a, b, ArithmeticOp::Divide)
}
