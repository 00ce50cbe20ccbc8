//! Core trait for critical value estimation
//!
//! Every strategy consumes the same input, a residual field already
//! normalized to unit pointwise variance, and returns the two-sided
//! critical value `q` such that the supremum of the absolute limiting field
//! exceeds `q` with probability about `alpha`.

use scb_core::{NormalizedField, Result};

/// Critical value estimator for the maximum of a unit-variance field
///
/// Implementations are stateless with respect to the data: all method
/// parameters are fixed at construction, and the field is passed in.
pub trait QuantileEstimator: Send + Sync {
    /// Estimate the `1 - alpha` quantile of `sup |Z|`
    ///
    /// # Arguments
    /// * `field` - Normalized residual field
    /// * `alpha` - Significance level, `0 < alpha < 1`
    fn critical_value(&self, field: &NormalizedField, alpha: f64) -> Result<f64>;

    /// Method tag for logs and error context
    fn name(&self) -> &'static str;
}
