//! Functionals packaged with the domain they act on, so they can be
//! stored, moved around the domain, cut to sub-domains and executed
//! repeatedly.

use super::*;

/// When an internal processor runs relative to envelope communication.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProcessorLevel(pub u32);

impl ProcessorLevel {
    /// Right after the lattice update.
    pub const IMMEDIATE: ProcessorLevel = ProcessorLevel(0);
    /// Once envelopes are up to date.
    pub const AFTER_COMMUNICATION: ProcessorLevel = ProcessorLevel(1);
}

/// A single-operand functional that can be stored behind a box and
/// duplicated.
pub trait ProcessorFunctional<T, const GRID_DIMENSION: usize>:
    BoxFunctional<T, GRID_DIMENSION>
{
    fn clone_box(&self) -> Box<dyn ProcessorFunctional<T, GRID_DIMENSION>>;
}

impl<T, F, const GRID_DIMENSION: usize> ProcessorFunctional<T, GRID_DIMENSION>
    for F
where
    F: BoxFunctional<T, GRID_DIMENSION> + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn ProcessorFunctional<T, GRID_DIMENSION>> {
        Box::new(self.clone())
    }
}

impl<T: 'static, const GRID_DIMENSION: usize> Clone
    for Box<dyn ProcessorFunctional<T, GRID_DIMENSION>>
{
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

impl<T: 'static, const GRID_DIMENSION: usize> Functional
    for Box<dyn ProcessorFunctional<T, GRID_DIMENSION>>
{
    fn modifies(&self, operand: usize) -> bool {
        (**self).modifies(operand)
    }

    fn applies_to(&self) -> AppliesTo {
        (**self).applies_to()
    }
}

impl<T: 'static, const GRID_DIMENSION: usize> BoxFunctional<T, GRID_DIMENSION>
    for Box<dyn ProcessorFunctional<T, GRID_DIMENSION>>
{
    fn process(
        &mut self,
        domain: &AABB<GRID_DIMENSION>,
        field: &mut Operand<'_, T, GRID_DIMENSION>,
    ) {
        (**self).process(domain, field)
    }
}

pub struct DataProcessorGenerator<T, const GRID_DIMENSION: usize> {
    functional: Box<dyn ProcessorFunctional<T, GRID_DIMENSION>>,
    domain: AABB<GRID_DIMENSION>,
}

impl<T: 'static, const GRID_DIMENSION: usize> Clone
    for DataProcessorGenerator<T, GRID_DIMENSION>
{
    fn clone(&self) -> Self {
        DataProcessorGenerator {
            functional: self.functional.clone(),
            domain: self.domain,
        }
    }
}

impl<T: Clone + Send + Sync + 'static, const GRID_DIMENSION: usize>
    DataProcessorGenerator<T, GRID_DIMENSION>
{
    pub fn new<F>(functional: F, domain: AABB<GRID_DIMENSION>) -> Self
    where
        F: BoxFunctional<T, GRID_DIMENSION> + Clone + 'static,
    {
        DataProcessorGenerator {
            functional: Box::new(functional),
            domain,
        }
    }

    pub fn domain(&self) -> &AABB<GRID_DIMENSION> {
        &self.domain
    }

    pub fn shift(&mut self, offset: &Coord<GRID_DIMENSION>) {
        self.domain = self.domain.shift(offset);
    }

    /// Generator restricted to the part of its domain inside `sub`.
    pub fn extract(&self, sub: &AABB<GRID_DIMENSION>) -> Option<Self> {
        self.domain
            .intersection(sub)
            .map(|domain| DataProcessorGenerator {
                functional: self.functional.clone(),
                domain,
            })
    }

    pub fn generate(&self) -> DataProcessor<T, GRID_DIMENSION> {
        DataProcessor {
            functional: self.functional.clone(),
            domain: self.domain,
        }
    }

    /// Execute a copy of the functional once on `field`.
    pub fn apply_to(
        &self,
        field: &mut Field<T, GRID_DIMENSION>,
    ) -> Application<GRID_DIMENSION> {
        apply(self.functional.clone(), self.domain, field)
    }
}

/// A generated processor, bound to its domain and executed once per
/// lattice update.
pub struct DataProcessor<T, const GRID_DIMENSION: usize> {
    functional: Box<dyn ProcessorFunctional<T, GRID_DIMENSION>>,
    domain: AABB<GRID_DIMENSION>,
}

impl<T: Clone + Send + Sync + 'static, const GRID_DIMENSION: usize>
    DataProcessor<T, GRID_DIMENSION>
{
    pub fn domain(&self) -> &AABB<GRID_DIMENSION> {
        &self.domain
    }

    pub fn process(
        &self,
        field: &mut Field<T, GRID_DIMENSION>,
    ) -> Application<GRID_DIMENSION> {
        apply(self.functional.clone(), self.domain, field)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[derive(Clone)]
    struct AddOne;

    impl Functional for AddOne {
        fn modifies(&self, _operand: usize) -> bool {
            true
        }
    }

    impl BoxFunctional<f64, 2> for AddOne {
        fn process(
            &mut self,
            domain: &AABB<2>,
            field: &mut Operand<'_, f64, 2>,
        ) {
            for c in domain.coord_iter() {
                *field.get_mut(&c) += 1.0;
            }
        }
    }

    #[test]
    fn extract_test() {
        let g = DataProcessorGenerator::<f64, 2>::new(
            AddOne,
            AABB::new(matrix![0, 3; 0, 3]),
        );
        let sub = g.extract(&AABB::new(matrix![2, 8; 1, 1])).unwrap();
        assert_eq!(*sub.domain(), AABB::new(matrix![2, 3; 1, 1]));
        assert!(g.extract(&AABB::new(matrix![4, 8; 0, 3])).is_none());
    }

    #[test]
    fn repeated_execution_test() {
        let mut f = ScalarField::new(vector![4, 4], 0.0);
        let mut g = DataProcessorGenerator::<f64, 2>::new(
            AddOne,
            AABB::new(matrix![0, 1; 0, 3]),
        );
        g.shift(&vector![1, 0]);
        let p = g.generate();
        p.process(&mut f);
        p.process(&mut f);
        g.apply_to(&mut f);
        assert_eq!(*f.get(&vector![0, 0]), 0.0);
        assert_eq!(*f.get(&vector![1, 2]), 3.0);
        assert_eq!(*f.get(&vector![2, 3]), 3.0);
        assert_eq!(*f.get(&vector![3, 3]), 0.0);
    }
}
