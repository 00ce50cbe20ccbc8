//! Difference of the means of two independent samples

use super::mean::centered;
use super::{Statistic, StatisticOutput};
use nalgebra::DMatrix;
use scb_core::{Error, FunctionalSample, GridDims, ResidualField, Result};

/// `mean(Y1) - mean(Y2)` on a shared grid
///
/// With `c = N2 / N1` the residuals of the first sample are scaled by
/// `sqrt(1 + c)` and those of the second by `sqrt(1 + 1/c)`, then stacked
/// with subdivision `[N1, N1 + N2]`. After group-weighted normalization the
/// field's covariance is proportional to `C1 / N1 + C2 / N2`, the covariance
/// of the difference.
#[derive(Debug, Clone, Copy)]
pub struct MeanDifference<'a> {
    first: &'a FunctionalSample,
    second: &'a FunctionalSample,
}

impl<'a> MeanDifference<'a> {
    pub fn new(first: &'a FunctionalSample, second: &'a FunctionalSample) -> Self {
        Self { first, second }
    }
}

impl Statistic for MeanDifference<'_> {
    fn name(&self) -> &'static str {
        "mean difference"
    }

    fn grid(&self) -> GridDims {
        self.first.grid()
    }

    fn validate(&self) -> Result<()> {
        if self.first.grid() != self.second.grid() {
            return Err(Error::shape(format!(
                "samples live on different grids: {} and {}",
                self.first.grid(),
                self.second.grid()
            )));
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<StatisticOutput> {
        let (n1, n2) = (self.first.n(), self.second.n());
        let c = n2 as f64 / n1 as f64;

        let mean1 = self.first.pointwise_mean();
        let mean2 = self.second.pointwise_mean();
        let var1 = self.first.pointwise_variance(&mean1);
        let var2 = self.second.pointwise_variance(&mean2);

        let estimate = mean1.iter().zip(&mean2).map(|(a, b)| a - b).collect();
        let se = var1
            .iter()
            .zip(&var2)
            .map(|(v1, v2)| (v1 / n1 as f64 + v2 / n2 as f64).sqrt())
            .collect();

        let r1 = centered(self.first, &mean1) * (1.0 + c).sqrt();
        let r2 = centered(self.second, &mean2) * (1.0 + 1.0 / c).sqrt();
        let points = r1.nrows();
        let mut stacked = DMatrix::zeros(points, n1 + n2);
        stacked.columns_mut(0, n1).copy_from(&r1);
        stacked.columns_mut(n1, n2).copy_from(&r2);
        let residuals = ResidualField::with_subdivision(self.grid(), stacked, vec![n1, n1 + n2])?;

        Ok(StatisticOutput {
            estimate,
            residuals,
            se,
            df: (n1 + n2 - 2) as f64,
            bias: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_difference_output() {
        let a = FunctionalSample::from_curves(&[vec![1.0, 2.0], vec![3.0, 2.0]]).unwrap();
        let b = FunctionalSample::from_curves(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![3.0, 2.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        let stat = MeanDifference::new(&a, &b);
        stat.validate().unwrap();
        let out = stat.evaluate().unwrap();

        assert_relative_eq!(out.estimate[0], 1.0);
        assert_relative_eq!(out.estimate[1], 1.0);
        // var(a) = [2, 0], var(b) = [2, 2/3]
        assert_relative_eq!(out.se[0], (2.0 / 2.0 + 2.0 / 4.0f64).sqrt());
        assert_relative_eq!(out.se[1], ((2.0 / 3.0) / 4.0f64).sqrt());
        assert_eq!(out.df, 4.0);
        assert_eq!(out.residuals.subdivision(), &[2, 6]);
        // c = 2: first group scaled by sqrt(3)
        assert_relative_eq!(out.residuals.data()[(0, 0)], -(3.0f64).sqrt());
        assert_relative_eq!(out.residuals.data()[(0, 2)], -1.0 * (1.5f64).sqrt());
    }

    #[test]
    fn test_grid_mismatch() {
        let a = FunctionalSample::from_curves(&[vec![1.0, 2.0], vec![3.0, 2.0]]).unwrap();
        let b = FunctionalSample::from_curves(&[vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]]).unwrap();
        assert!(matches!(
            MeanDifference::new(&a, &b).validate(),
            Err(Error::InputShape(_))
        ));
    }
}
