//! Simultaneous confidence bands for functional data
//!
//! Bands are built for the pointwise mean, the difference of two means, the
//! signal-to-noise ratio, delta-method functionals (skewness, kurtosis) and
//! linear contrasts of a pointwise OLS fit. The critical value comes from
//! any of the strategies in `scb_quantile`.
//!
//! # Example
//!
//! ```rust
//! use scb_bands::scb_meandiff;
//! use scb_core::FunctionalSample;
//! use scb_quantile::QuantileOptions;
//!
//! let curve = |n: usize, shift: f64| -> Vec<f64> {
//!     (0..25).map(|t| shift + ((t + 3 * n) as f64 / 4.0).cos()).collect()
//! };
//! let first = FunctionalSample::from_curves(&(0..15).map(|n| curve(n, 1.0)).collect::<Vec<_>>()).unwrap();
//! let second = FunctionalSample::from_curves(&(0..12).map(|n| curve(n, 0.0)).collect::<Vec<_>>()).unwrap();
//!
//! let options = QuantileOptions::new().with_mboots(1000).with_seed(1);
//! let result = scb_meandiff(&first, &second, 0.9, "MultiplierBootstrap", &options).unwrap();
//! assert_eq!(result.estimate.len(), 25);
//! ```

pub mod api;
pub mod band;
pub mod smoothing;
pub mod statistic;

pub use api::{scb_contrast, scb_delta, scb_mean, scb_meandiff, scb_snr, simultaneous_band};
pub use band::{Band, BandBuilder, ScbResult};
pub use smoothing::{Kernel, LocalLinearSmoother};
pub use statistic::{
    snr_bias_factor, ContrastGrid, DeltaFunctional, DeltaStatistic, Kurtosis, LinearContrast,
    MeanDifference, MeanStatistic, PointMoments, Skewness, Snr, Statistic, StatisticOutput,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        scb_contrast, scb_delta, scb_mean, scb_meandiff, scb_snr, Band, ContrastGrid,
        DeltaFunctional, Kernel, Kurtosis, LocalLinearSmoother, ScbResult, Skewness, Snr,
        Statistic,
    };
}
