//! Gaussian Kinematic Formula quantiles
//!
//! The curvatures of the domain are estimated from the normalized residuals
//! and the expected-Euler-characteristic tail is inverted for the limiting
//! field: Gaussian for `GKF`, Student-t for `tGKF`.

use crate::ec_density::FieldKind;
use crate::lkc::{estimate_lkc, CurvatureEstimator};
use crate::traits::QuantileEstimator;
use scb_core::{NormalizedField, Result};
use std::sync::Arc;
use tracing::{debug, instrument};

/// GKF critical value estimator
#[derive(Debug, Clone)]
pub struct GkfQuantile {
    kind: FieldKind,
    l0: f64,
    estimator: Arc<dyn CurvatureEstimator>,
}

impl GkfQuantile {
    pub fn new(kind: FieldKind, l0: f64, estimator: Arc<dyn CurvatureEstimator>) -> Self {
        Self {
            kind,
            l0,
            estimator,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// `[L_0, .., L_D]` of the field's domain
    pub fn lkc(&self, field: &NormalizedField) -> Result<Vec<f64>> {
        estimate_lkc(field, self.estimator.as_ref(), self.l0)
            .map_err(|e| e.in_stage(self.name(), "lkc"))
    }
}

impl QuantileEstimator for GkfQuantile {
    #[instrument(skip(self, field), fields(method = self.name(), estimator = self.estimator.name()))]
    fn critical_value(&self, field: &NormalizedField, alpha: f64) -> Result<f64> {
        let lkc = self.lkc(field)?;
        debug!(?lkc, "domain curvatures");
        self.kind
            .quantile(&lkc, alpha)
            .map_err(|e| e.in_stage(self.name(), "quantile"))
    }

    fn name(&self) -> &'static str {
        match self.kind {
            FieldKind::Gauss => "GKF",
            FieldKind::StudentT { .. } => "tGKF",
        }
    }
}
