//! Simultaneous confidence bands for functional data
//!
//! Facade over the workspace crates:
//!
//! - [`scb_core`]: samples, residual fields, errors and execution
//! - [`scb_quantile`]: critical values via the Gaussian Kinematic Formula
//!   (Gaussian and Student-t) or bootstrap
//! - [`scb_bands`]: statistics and band construction, with the `scb_*`
//!   entry points re-exported at the top level
//! - [`scb_fields`]: smooth random field generators for tests and demos
//!
//! # Example
//!
//! ```rust
//! use functional_scb::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let field = SinCosField::new(60, vec![1.5]).unwrap();
//! let sample = sample_field(&field, 50, |t: &[f64]| t[0], &ConstantSd(1.0), &mut rng).unwrap();
//!
//! let result = scb_mean(&sample, 0.95, "tGKF", &QuantileOptions::new()).unwrap();
//! assert!(result.lower().iter().zip(&result.estimate).all(|(l, e)| l <= e));
//! ```

pub use scb_bands;
pub use scb_core;
pub use scb_fields;
pub use scb_quantile;

pub use scb_bands::{
    scb_contrast, scb_delta, scb_mean, scb_meandiff, scb_snr, simultaneous_band, Band,
    ContrastGrid, Kernel, Kurtosis, LocalLinearSmoother, ScbResult, Skewness, Snr, Statistic,
};
pub use scb_core::{Error, FunctionalSample, GridDims, Result};
pub use scb_quantile::{
    estimate_lkc, BootstrapVariant, CurvatureEstimator, DirectLkc, MultiplierKind, QuantileMethod,
    QuantileOptions,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use scb_bands::prelude::*;
    pub use scb_core::prelude::*;
    pub use scb_fields::{sample_field, ConstantSd, GaussDensityField, SinCosField};
    pub use scb_quantile::prelude::*;
}
