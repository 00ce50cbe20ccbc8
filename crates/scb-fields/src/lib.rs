//! Random field generators for tests, benchmarks and demos
//!
//! Generators produce smooth zero-mean, unit-variance realizations; a mean
//! function and an [`SdFunction`] turn them into a [`FunctionalSample`]
//! with known truth.
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use scb_fields::{sample_field, ConstantSd, SinCosField};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let field = SinCosField::new(50, vec![1.5]).unwrap();
//! let sample = sample_field(&field, 20, |t: &[f64]| t[0].sin(), &ConstantSd(0.5), &mut rng).unwrap();
//! assert_eq!(sample.n(), 20);
//! assert_eq!(sample.points(), 50);
//! ```

pub mod fields;
pub mod sd;

pub use fields::{grid_coordinates, unit_interval, FieldGenerator, GaussDensityField, SinCosField};
pub use sd::{ConstantSd, LinearSd, SdFunction};

use nalgebra::DMatrix;
use rand::Rng;
use scb_core::{Error, FunctionalSample, Result};

/// Draw `n` realizations of `mean(x) + sd(x) * Z(x)`
pub fn sample_field<G, M, R>(
    generator: &G,
    n: usize,
    mean: M,
    sd: &dyn SdFunction,
    rng: &mut R,
) -> Result<FunctionalSample>
where
    G: FieldGenerator,
    M: Fn(&[f64]) -> f64,
    R: Rng + ?Sized,
{
    let grid = generator.grid();
    let coords = grid_coordinates(grid);
    let mu: Vec<f64> = coords.iter().map(|x| mean(x)).collect();
    let sigma: Vec<f64> = coords.iter().map(|x| sd.sd(x)).collect();
    if sigma.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
        return Err(Error::InvalidParameter(
            "standard deviation function must be finite and non-negative".to_string(),
        ));
    }

    let mut data = DMatrix::zeros(grid.points(), n);
    for col in 0..n {
        let z = generator.realization(rng);
        for (p, value) in z.into_iter().enumerate() {
            data[(p, col)] = mu[p] + sigma[p] * value;
        }
    }
    FunctionalSample::from_matrix(grid, data)
}

/// Mean function that is zero everywhere
pub fn zero_mean(_x: &[f64]) -> f64 {
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use scb_core::GridDims;

    #[test]
    fn test_sample_applies_mean_and_sd() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let field = GaussDensityField::new(GridDims::OneD(20), 6, 0.15).unwrap();
        let sample = sample_field(&field, 4000, |x: &[f64]| 2.0 + x[0], &LinearSd { start: 1.0, end: 2.0 }, &mut rng)
            .unwrap();
        let mean = sample.pointwise_mean();
        let var = sample.pointwise_variance(&mean);
        assert_relative_eq!(mean[0], 2.0, epsilon = 0.1);
        assert_relative_eq!(mean[19], 3.0, epsilon = 0.15);
        assert_relative_eq!(var[0].sqrt(), 1.0, epsilon = 0.05);
        assert_relative_eq!(var[19].sqrt(), 2.0, epsilon = 0.1);
    }

    #[test]
    fn test_sample_rejects_negative_sd() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let field = SinCosField::new(5, vec![1.0]).unwrap();
        assert!(sample_field(&field, 10, zero_mean, &ConstantSd(-1.0), &mut rng).is_err());
        assert!(sample_field(&field, 1, zero_mean, &ConstantSd(1.0), &mut rng).is_err());
    }
}
