//! High-level API for simultaneous confidence bands
//!
//! Every entry point runs the same pipeline:
//!
//! 1. resolve and validate the quantile configuration and the statistic's
//!    inputs (no numeric work on data before this succeeds)
//! 2. evaluate the statistic: estimate, residuals, standard error, df
//! 3. normalize the residual field and estimate the critical value `q`
//! 4. build `[estimate - q se, estimate + q se]`

use crate::band::{BandBuilder, ScbResult};
use crate::statistic::{
    ContrastGrid, DeltaFunctional, DeltaStatistic, LinearContrast, MeanDifference, MeanStatistic,
    Snr, Statistic,
};
use nalgebra::{DMatrix, DVector};
use scb_core::{FunctionalSample, Result};
use scb_quantile::{resolve_quantile_config, QuantileOptions};
use tracing::{debug, instrument};

/// Band for any [`Statistic`]
///
/// # Arguments
/// * `statistic` - Statistic plug-in holding the sample(s)
/// * `level` - Confidence level in `(0, 1)`, e.g. 0.95
/// * `method` - Quantile method tag: `tGKF`, `GKF`, `NonParametricBootstrap`
///   or `MultiplierBootstrap` (case-insensitive)
/// * `options` - Method options; inapplicable ones are ignored with a warning
#[instrument(skip(statistic, options), fields(stat = statistic.name(), grid = %statistic.grid()))]
pub fn simultaneous_band<S>(
    statistic: &S,
    level: f64,
    method: &str,
    options: &QuantileOptions,
) -> Result<ScbResult>
where
    S: Statistic + ?Sized,
{
    let config = resolve_quantile_config(method, level, options)?;
    statistic.validate()?;

    let output = statistic.evaluate()?;
    let estimate = output.corrected_estimate();
    let field = output.residuals.normalize()?;
    debug!(n = field.n(), df = output.df, bias = output.bias, "statistic evaluated");

    let q = config.quantile(&field, output.df)?;
    let band = BandBuilder::new(q)?.build(&estimate, &output.se)?;

    let result = ScbResult {
        estimate,
        band,
        level,
        quantile: q,
        method: config.method(),
        se: output.se,
        df: output.df,
        grid: field.grid(),
        coordinates: None,
        residuals: field,
    };
    statistic.finalize(result)
}

/// Band for the mean of one sample
///
/// # Example
/// ```rust
/// use scb_bands::scb_mean;
/// use scb_core::FunctionalSample;
/// use scb_quantile::QuantileOptions;
///
/// let curves: Vec<Vec<f64>> = (0..20)
///     .map(|n| (0..30).map(|t| ((t as f64) / 5.0 + n as f64).sin()).collect())
///     .collect();
/// let sample = FunctionalSample::from_curves(&curves).unwrap();
/// let result = scb_mean(&sample, 0.95, "tGKF", &QuantileOptions::new()).unwrap();
/// assert!(result.quantile > 2.0);
/// ```
pub fn scb_mean(
    sample: &FunctionalSample,
    level: f64,
    method: &str,
    options: &QuantileOptions,
) -> Result<ScbResult> {
    simultaneous_band(&MeanStatistic::new(sample), level, method, options)
}

/// Band for `mean(first) - mean(second)`
pub fn scb_meandiff(
    first: &FunctionalSample,
    second: &FunctionalSample,
    level: f64,
    method: &str,
    options: &QuantileOptions,
) -> Result<ScbResult> {
    simultaneous_band(&MeanDifference::new(first, second), level, method, options)
}

/// Band for the bias-corrected signal-to-noise ratio `mean / sd`
pub fn scb_snr(
    sample: &FunctionalSample,
    level: f64,
    method: &str,
    options: &QuantileOptions,
) -> Result<ScbResult> {
    simultaneous_band(&DeltaStatistic::new(sample, &Snr), level, method, options)
}

/// Band for a delta-method functional such as [`crate::Skewness`]
pub fn scb_delta(
    sample: &FunctionalSample,
    functional: &dyn DeltaFunctional,
    level: f64,
    method: &str,
    options: &QuantileOptions,
) -> Result<ScbResult> {
    simultaneous_band(&DeltaStatistic::new(sample, functional), level, method, options)
}

/// Band for the linear contrast `c' beta(t)` of a pointwise OLS fit
///
/// `design` is `N x p`, `contrast` has length `p`.
pub fn scb_contrast(
    sample: &FunctionalSample,
    design: &DMatrix<f64>,
    contrast: &DVector<f64>,
    grid: ContrastGrid,
    level: f64,
    method: &str,
    options: &QuantileOptions,
) -> Result<ScbResult> {
    simultaneous_band(
        &LinearContrast::new(sample, design, contrast, grid),
        level,
        method,
        options,
    )
}
