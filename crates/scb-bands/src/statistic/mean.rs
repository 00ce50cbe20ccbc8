//! Pointwise mean

use super::{Statistic, StatisticOutput};
use nalgebra::DMatrix;
use scb_core::{FunctionalSample, GridDims, ResidualField, Result};

/// Mean of one sample: `se = sd / sqrt(N)`, `df = N - 1`
#[derive(Debug, Clone, Copy)]
pub struct MeanStatistic<'a> {
    sample: &'a FunctionalSample,
}

impl<'a> MeanStatistic<'a> {
    pub fn new(sample: &'a FunctionalSample) -> Self {
        Self { sample }
    }
}

/// Residuals `Y - mean`, one column per realization
pub(crate) fn centered(sample: &FunctionalSample, mean: &[f64]) -> DMatrix<f64> {
    let data = sample.data();
    DMatrix::from_fn(data.nrows(), data.ncols(), |p, n| data[(p, n)] - mean[p])
}

impl Statistic for MeanStatistic<'_> {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn grid(&self) -> GridDims {
        self.sample.grid()
    }

    fn validate(&self) -> Result<()> {
        // FunctionalSample already guarantees N >= 2 and finite values
        Ok(())
    }

    fn evaluate(&self) -> Result<StatisticOutput> {
        let n = self.sample.n() as f64;
        let mean = self.sample.pointwise_mean();
        let se = self
            .sample
            .pointwise_variance(&mean)
            .into_iter()
            .map(|v| (v / n).sqrt())
            .collect();
        let residuals = ResidualField::new(self.grid(), centered(self.sample, &mean))?;
        Ok(StatisticOutput {
            estimate: mean,
            residuals,
            se,
            df: n - 1.0,
            bias: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_output() {
        let curves = vec![vec![1.0, 0.0], vec![3.0, 0.0], vec![5.0, 3.0]];
        let sample = FunctionalSample::from_curves(&curves).unwrap();
        let out = MeanStatistic::new(&sample).evaluate().unwrap();
        assert_eq!(out.estimate, vec![3.0, 1.0]);
        // var = 4 and 3, N = 3
        assert_relative_eq!(out.se[0], (4.0f64 / 3.0).sqrt());
        assert_relative_eq!(out.se[1], 1.0);
        assert_eq!(out.df, 2.0);
        assert_eq!(out.residuals.data()[(0, 0)], -2.0);
        assert_eq!(out.residuals.subdivision(), &[3]);
    }
}
