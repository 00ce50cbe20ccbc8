//! Pointwise statistics and their residual fields
//!
//! Every band runs through the same pipeline; a [`Statistic`] supplies the
//! statistic-specific pieces: the point estimate, a residual field whose law
//! matches the statistic's pivot, the standard error field, the degrees of
//! freedom and a multiplicative bias correction.

pub mod contrast;
pub mod delta;
pub mod mean;
pub mod mean_diff;

pub use contrast::{ContrastGrid, LinearContrast};
pub use delta::{
    snr_bias_factor, DeltaFunctional, DeltaStatistic, Kurtosis, PointMoments, Skewness, Snr,
};
pub use mean::MeanStatistic;
pub use mean_diff::MeanDifference;

use crate::band::ScbResult;
use scb_core::{GridDims, ResidualField, Result};

/// Everything the quantile and band stages need from a statistic
#[derive(Debug, Clone)]
pub struct StatisticOutput {
    pub estimate: Vec<f64>,
    pub residuals: ResidualField,
    pub se: Vec<f64>,
    pub df: f64,
    /// Multiplies the estimate before banding
    pub bias: f64,
}

impl StatisticOutput {
    /// Estimate with the bias factor applied
    pub fn corrected_estimate(&self) -> Vec<f64> {
        if self.bias == 1.0 {
            return self.estimate.clone();
        }
        self.estimate.iter().map(|e| e * self.bias).collect()
    }
}

/// Statistic plug-in for [`crate::simultaneous_band`]
pub trait Statistic {
    /// Statistic name for logs
    fn name(&self) -> &'static str;

    /// Grid the statistic is evaluated on
    fn grid(&self) -> GridDims;

    /// Shape and parameter checks; must not do numeric work on the data
    fn validate(&self) -> Result<()>;

    /// Point estimate, residuals, standard error and degrees of freedom
    fn evaluate(&self) -> Result<StatisticOutput>;

    /// Post-process the finished band, e.g. interpolate onto an output grid
    fn finalize(&self, result: ScbResult) -> Result<ScbResult> {
        Ok(result)
    }
}
