//! Delta-method statistics: SNR, skewness and kurtosis
//!
//! A smooth functional of the pointwise moments is asymptotically normal
//! with variance equal to the variance of its influence function. The
//! residual field is the influence function evaluated at every realization,
//! centered per grid point, and `se = sd(influence) / sqrt(N)`.

use super::{Statistic, StatisticOutput};
use nalgebra::DMatrix;
use scb_core::{Error, FunctionalSample, GridDims, ResidualField, Result};
use statrs::function::gamma::ln_gamma;
use std::fmt::Debug;

/// Sample sizes above this use no SNR bias correction
pub const SNR_BIAS_MAX_N: usize = 250;

/// Sample moments of one grid point
///
/// `skewness` and `kurtosis` are the means of `z^3` and `z^4` over the
/// standardized values `z = (y - mean) / sd`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMoments {
    pub mean: f64,
    pub sd: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl PointMoments {
    /// Moments of standardized values `z` taken with `mean` and `sd`
    pub fn from_standardized(mean: f64, sd: f64, z: &[f64]) -> Self {
        let n = z.len() as f64;
        let (m3, m4) = z.iter().fold((0.0, 0.0), |(m3, m4), &zi| {
            let z2 = zi * zi;
            (m3 + z2 * zi, m4 + z2 * z2)
        });
        Self {
            mean,
            sd,
            skewness: m3 / n,
            kurtosis: m4 / n,
        }
    }
}

/// Smooth functional of the pointwise moments
pub trait DeltaFunctional: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Smallest sample size the functional is defined for
    fn min_realizations(&self) -> usize {
        3
    }

    /// Point estimate from the moments of one grid point
    fn estimate(&self, moments: &PointMoments) -> f64;

    /// Influence function at standardized value `z`
    fn influence(&self, z: f64, estimate: f64, moments: &PointMoments) -> f64;

    /// Multiplicative finite-sample bias correction
    fn bias_factor(&self, _n: usize) -> f64 {
        1.0
    }
}

/// Signal-to-noise ratio `mean / sd`
#[derive(Debug, Clone, Copy, Default)]
pub struct Snr;

/// Standardized third moment
#[derive(Debug, Clone, Copy, Default)]
pub struct Skewness;

/// Standardized fourth moment (not excess kurtosis)
#[derive(Debug, Clone, Copy, Default)]
pub struct Kurtosis;

/// `Gamma((N-1)/2) / Gamma((N-2)/2) * sqrt(2 / (N-1))` for `3 <= N <= 250`, else 1
///
/// Makes `b(N) * mean / sd` unbiased for Gaussian data.
pub fn snr_bias_factor(n: usize) -> f64 {
    if !(3..=SNR_BIAS_MAX_N).contains(&n) {
        return 1.0;
    }
    let n = n as f64;
    (ln_gamma((n - 1.0) / 2.0) - ln_gamma((n - 2.0) / 2.0)).exp() * (2.0 / (n - 1.0)).sqrt()
}

impl DeltaFunctional for Snr {
    fn name(&self) -> &'static str {
        "SNR"
    }

    fn estimate(&self, moments: &PointMoments) -> f64 {
        moments.mean / moments.sd
    }

    fn influence(&self, z: f64, snr: f64, _moments: &PointMoments) -> f64 {
        z - 0.5 * snr * (z * z - 1.0)
    }

    fn bias_factor(&self, n: usize) -> f64 {
        snr_bias_factor(n)
    }
}

impl DeltaFunctional for Skewness {
    fn name(&self) -> &'static str {
        "skewness"
    }

    fn estimate(&self, moments: &PointMoments) -> f64 {
        moments.skewness
    }

    fn influence(&self, z: f64, gamma: f64, _moments: &PointMoments) -> f64 {
        z.powi(3) - gamma - 3.0 * z - 1.5 * gamma * (z * z - 1.0)
    }
}

impl DeltaFunctional for Kurtosis {
    fn name(&self) -> &'static str {
        "kurtosis"
    }

    fn estimate(&self, moments: &PointMoments) -> f64 {
        moments.kurtosis
    }

    /// Includes `-4 gamma z` from centering the fourth moment at the sample mean
    fn influence(&self, z: f64, kappa: f64, moments: &PointMoments) -> f64 {
        z.powi(4) - kappa - 4.0 * moments.skewness * z - 2.0 * kappa * (z * z - 1.0)
    }
}

/// Delta-method statistic of one sample
#[derive(Debug, Clone, Copy)]
pub struct DeltaStatistic<'a> {
    sample: &'a FunctionalSample,
    functional: &'a dyn DeltaFunctional,
}

impl<'a> DeltaStatistic<'a> {
    pub fn new(sample: &'a FunctionalSample, functional: &'a dyn DeltaFunctional) -> Self {
        Self { sample, functional }
    }
}

impl Statistic for DeltaStatistic<'_> {
    fn name(&self) -> &'static str {
        self.functional.name()
    }

    fn grid(&self) -> GridDims {
        self.sample.grid()
    }

    fn validate(&self) -> Result<()> {
        let required = self.functional.min_realizations();
        if self.sample.n() < required {
            return Err(Error::too_few_realizations(required, self.sample.n()));
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<StatisticOutput> {
        let data = self.sample.data();
        let (points, n) = (data.nrows(), data.ncols());
        let nf = n as f64;
        let mean = self.sample.pointwise_mean();
        let var = self.sample.pointwise_variance(&mean);

        let mut estimate = Vec::with_capacity(points);
        let mut se = Vec::with_capacity(points);
        let mut influence = DMatrix::zeros(points, n);
        let mut z = vec![0.0; n];
        for p in 0..points {
            let sd = var[p].sqrt();
            if sd <= 0.0 {
                return Err(Error::numerical(
                    "statistic",
                    format!("{} undefined: zero standard deviation at grid point {p}", self.name()),
                ));
            }
            for (zi, y) in z.iter_mut().zip(data.row(p).iter()) {
                *zi = (y - mean[p]) / sd;
            }
            let moments = PointMoments::from_standardized(mean[p], sd, &z);
            let theta = self.functional.estimate(&moments);

            let psi: Vec<f64> = z
                .iter()
                .map(|&zi| self.functional.influence(zi, theta, &moments))
                .collect();
            let psi_mean = psi.iter().sum::<f64>() / nf;
            let mut ss = 0.0;
            for (col, value) in psi.into_iter().enumerate() {
                let r = value - psi_mean;
                influence[(p, col)] = r;
                ss += r * r;
            }
            estimate.push(theta);
            se.push((ss / (nf - 1.0)).sqrt() / nf.sqrt());
        }

        Ok(StatisticOutput {
            estimate,
            residuals: ResidualField::new(self.grid(), influence)?,
            se,
            df: nf - 1.0,
            bias: self.functional.bias_factor(n),
        })
    }
}
