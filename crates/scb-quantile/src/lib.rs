//! Critical values for simultaneous confidence bands
//!
//! Given a residual field normalized to unit pointwise variance, this crate
//! estimates the two-sided critical value `q` of the maximum of the limiting
//! field. Four strategies are available:
//!
//! - `tGKF` and `GKF`: Gaussian Kinematic Formula with Student-t or Gaussian
//!   Euler-characteristic densities, using curvatures estimated from the
//!   residuals ([`lkc`], [`ec_density`])
//! - `NonParametricBootstrap` and `MultiplierBootstrap`: resampling the
//!   maximum of the field ([`bootstrap`])
//!
//! Method tags and options are validated once by
//! [`resolve_quantile_config`], which never touches data.
//!
//! # Example
//!
//! ```rust
//! use scb_quantile::{resolve_quantile_config, QuantileOptions};
//!
//! let options = QuantileOptions::new().with_mboots(2000).with_seed(7);
//! let config = resolve_quantile_config("MultiplierBootstrap", 0.95, &options).unwrap();
//! assert!((config.alpha - 0.05).abs() < 1e-12);
//!
//! assert!(resolve_quantile_config("bogus", 0.95, &options).is_err());
//! ```

pub mod bootstrap;
pub mod config;
pub mod ec_density;
pub mod gkf;
pub mod lkc;
pub mod traits;

pub use bootstrap::{BootstrapParams, MultiplierBootstrap, NonParametricBootstrap};
pub use config::{
    resolve_quantile_config, validate_level, BootstrapVariant, MultiplierKind, QuantileConfig,
    QuantileMethod, QuantileOptions, QuantileStrategy, DEFAULT_L0, DEFAULT_MBOOTS,
};
pub use ec_density::FieldKind;
pub use gkf::GkfQuantile;
pub use lkc::{estimate_lkc, CurvatureEstimator, DirectLkc};
pub use traits::QuantileEstimator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        resolve_quantile_config, BootstrapVariant, CurvatureEstimator, DirectLkc, MultiplierKind,
        QuantileConfig, QuantileEstimator, QuantileMethod, QuantileOptions,
    };
}
