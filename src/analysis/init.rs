//! Initial conditions for scalar fields.

use super::*;
use clap::ValueEnum;
use rand::prelude::*;
use rayon::prelude::*;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum InitialCondition {
    #[default]
    Constant,
    /// Uniform noise in `[-amplitude, amplitude)` around the current
    /// values.
    Perturbation { amplitude: f64, seed: u64 },
    /// Gaussian bump centred in the field, values in `(0, 1]`.
    Impulse { variance: f64 },
}

#[derive(Copy, Clone, Debug, ValueEnum, Default)]
pub enum ClapInitialCondition {
    #[default]
    Constant,
    Perturbation,
    Impulse,
}

pub fn generate_initial_condition<const GRID_DIMENSION: usize>(
    field: &mut ScalarField<GRID_DIMENSION>,
    condition: InitialCondition,
    chunk_size: usize,
) {
    match condition {
        InitialCondition::Constant => {}
        InitialCondition::Perturbation { amplitude, seed } => {
            random_perturbation(field, amplitude, seed, chunk_size);
        }
        InitialCondition::Impulse { variance } => {
            gaussian_impulse(field, variance, chunk_size);
        }
    }
}

/// Adds seeded uniform noise. Each chunk of cells draws from its own
/// generator, so the result does not depend on the number of threads.
pub fn random_perturbation<const GRID_DIMENSION: usize>(
    field: &mut ScalarField<GRID_DIMENSION>,
    amplitude: f64,
    seed: u64,
    chunk_size: usize,
) {
    if amplitude == 0.0 {
        return;
    }
    field.par_modify_access(chunk_size).enumerate().for_each(
        |(i, mut d): (usize, FieldChunk<'_, f64, GRID_DIMENSION>)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            d.coord_iter_mut().for_each(|(_, value_mut)| {
                *value_mut += rng.gen_range(-amplitude..amplitude);
            })
        },
    );
}

pub fn gaussian_impulse<const GRID_DIMENSION: usize>(
    field: &mut ScalarField<GRID_DIMENSION>,
    variance: f64,
    chunk_size: usize,
) {
    let shape = field.shape();
    let width = shape[0] as f64;
    let sigma_sq = (width / variance) * (width / variance);
    field.par_set_values(
        |coord: Coord<GRID_DIMENSION>| {
            let r_sq: f64 = (0..GRID_DIMENSION)
                .map(|d| {
                    let x = coord[d] as f64 - shape[d] as f64 / 2.0;
                    x * x
                })
                .sum();
            (-r_sq / (2.0 * sigma_sq)).exp()
        },
        chunk_size,
    );
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn perturbation_test() {
        let mut a = ScalarField::new(vector![8, 8], 1.0);
        let mut b = ScalarField::new(vector![8, 8], 1.0);
        random_perturbation(&mut a, 0.1, 7, 16);
        random_perturbation(&mut b, 0.1, 7, 16);
        assert_eq!(a, b);
        assert!(a.buffer().iter().all(|v| (*v - 1.0).abs() <= 0.1));
        assert!(a.buffer().iter().any(|v| *v != 1.0));
    }

    #[test]
    fn impulse_test() {
        let mut f = ScalarField::new(vector![9, 9], 0.0);
        generate_initial_condition(
            &mut f,
            InitialCondition::Impulse { variance: 4.0 },
            10,
        );
        let peak = *f.get(&vector![4, 4]);
        assert!(f.buffer().iter().all(|v| *v > 0.0 && *v <= 1.0));
        assert!(*f.get(&vector![0, 0]) < peak);
    }
}
