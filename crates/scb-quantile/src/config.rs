//! Quantile method configuration and validation
//!
//! Callers hand over a method tag, a confidence level and a loosely typed
//! [`QuantileOptions`] object (which may come straight from JSON). All of it
//! is validated and defaulted in one place, [`resolve_quantile_config`],
//! before any numeric work happens. The result is a [`QuantileConfig`]
//! whose [`QuantileStrategy`] carries only typed, checked parameters.

use crate::bootstrap::{BootstrapParams, MultiplierBootstrap, NonParametricBootstrap};
use crate::ec_density::FieldKind;
use crate::gkf::GkfQuantile;
use crate::lkc::{CurvatureEstimator, DirectLkc};
use crate::traits::QuantileEstimator;
use rand::Rng;
use scb_core::{CancellationToken, Error, ExecutionStrategy, NormalizedField, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default Euler characteristic of the domain
pub const DEFAULT_L0: f64 = 1.0;

/// Default number of bootstrap resamples
pub const DEFAULT_MBOOTS: usize = 5000;

/// Quantile estimation methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantileMethod {
    /// GKF with Student-t Euler-characteristic densities
    #[default]
    #[serde(rename = "tGKF")]
    TGkf,
    /// GKF with Gaussian Euler-characteristic densities
    #[serde(rename = "GKF")]
    Gkf,
    /// Resampling realizations with replacement
    NonParametricBootstrap,
    /// Random multipliers on the residuals
    MultiplierBootstrap,
}

impl QuantileMethod {
    pub const ALL: [QuantileMethod; 4] = [
        QuantileMethod::TGkf,
        QuantileMethod::Gkf,
        QuantileMethod::NonParametricBootstrap,
        QuantileMethod::MultiplierBootstrap,
    ];

    /// Canonical tag
    pub fn tag(&self) -> &'static str {
        match self {
            QuantileMethod::TGkf => "tGKF",
            QuantileMethod::Gkf => "GKF",
            QuantileMethod::NonParametricBootstrap => "NonParametricBootstrap",
            QuantileMethod::MultiplierBootstrap => "MultiplierBootstrap",
        }
    }

    pub fn is_gkf_family(&self) -> bool {
        matches!(self, QuantileMethod::TGkf | QuantileMethod::Gkf)
    }

    pub fn is_bootstrap_family(&self) -> bool {
        !self.is_gkf_family()
    }
}

impl fmt::Display for QuantileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for QuantileMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QuantileMethod::ALL
            .into_iter()
            .find(|m| m.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::UnsupportedMethod(format!(
                    "'{s}' is not one of tGKF, GKF, NonParametricBootstrap, MultiplierBootstrap"
                ))
            })
    }
}

/// Studentization of bootstrap replicates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapVariant {
    /// Scale by the original pointwise standard deviation
    Regular,
    /// Scale by each replicate's own pointwise standard deviation
    #[default]
    T,
}

/// Distribution of the multiplier weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierKind {
    /// Standard normal weights
    #[default]
    Gaussian,
    /// Random signs
    Rademacher,
}

/// Raw, unvalidated method options
///
/// Numeric options are read as `f64` so that a non-integer `L0` or `Mboots`
/// is reported as an error instead of being truncated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct QuantileOptions {
    /// Euler characteristic of the domain (GKF family)
    #[serde(alias = "L0")]
    pub l0: Option<f64>,
    /// Number of bootstrap resamples (bootstrap family)
    #[serde(alias = "Mboots")]
    pub mboots: Option<f64>,
    /// Base seed; resample `i` uses `seed + i`
    pub seed: Option<u64>,
    /// Replicate studentization (bootstrap family)
    pub bootstrap: Option<BootstrapVariant>,
    /// Multiplier distribution (multiplier bootstrap)
    pub multiplier: Option<MultiplierKind>,
    /// Scheduling of resamples (bootstrap family)
    pub execution: Option<ExecutionStrategy>,
    /// Curvature estimator (GKF family); defaults to [`DirectLkc`]
    #[serde(skip)]
    pub lkc_estimator: Option<Arc<dyn CurvatureEstimator>>,
    /// Cooperative cancellation for bootstrap runs
    #[serde(skip)]
    pub cancellation: Option<CancellationToken>,
}

impl QuantileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_l0(mut self, l0: impl Into<f64>) -> Self {
        self.l0 = Some(l0.into());
        self
    }

    pub fn with_mboots(mut self, mboots: impl Into<f64>) -> Self {
        self.mboots = Some(mboots.into());
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_bootstrap_variant(mut self, variant: BootstrapVariant) -> Self {
        self.bootstrap = Some(variant);
        self
    }

    pub fn with_multiplier(mut self, multiplier: MultiplierKind) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = Some(execution);
        self
    }

    pub fn with_lkc_estimator(mut self, estimator: Arc<dyn CurvatureEstimator>) -> Self {
        self.lkc_estimator = Some(estimator);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Validated method with its typed parameters
#[derive(Debug, Clone)]
pub enum QuantileStrategy {
    TGkf {
        l0: f64,
        estimator: Arc<dyn CurvatureEstimator>,
    },
    Gkf {
        l0: f64,
        estimator: Arc<dyn CurvatureEstimator>,
    },
    NonParametricBootstrap(BootstrapParams),
    MultiplierBootstrap {
        params: BootstrapParams,
        multiplier: MultiplierKind,
    },
}

/// Fully resolved quantile configuration
#[derive(Debug, Clone)]
pub struct QuantileConfig {
    pub strategy: QuantileStrategy,
    /// `1 - level`
    pub alpha: f64,
}

impl QuantileConfig {
    pub fn method(&self) -> QuantileMethod {
        match self.strategy {
            QuantileStrategy::TGkf { .. } => QuantileMethod::TGkf,
            QuantileStrategy::Gkf { .. } => QuantileMethod::Gkf,
            QuantileStrategy::NonParametricBootstrap(_) => QuantileMethod::NonParametricBootstrap,
            QuantileStrategy::MultiplierBootstrap { .. } => QuantileMethod::MultiplierBootstrap,
        }
    }

    pub fn level(&self) -> f64 {
        1.0 - self.alpha
    }

    /// Build the estimator; `df` is the degrees of freedom of the statistic
    /// and is only used by tGKF
    pub fn estimator(&self, df: f64) -> Result<Box<dyn QuantileEstimator>> {
        Ok(match &self.strategy {
            QuantileStrategy::TGkf { l0, estimator } => Box::new(GkfQuantile::new(
                FieldKind::student_t(df)?,
                *l0,
                Arc::clone(estimator),
            )),
            QuantileStrategy::Gkf { l0, estimator } => Box::new(GkfQuantile::new(
                FieldKind::Gauss,
                *l0,
                Arc::clone(estimator),
            )),
            QuantileStrategy::NonParametricBootstrap(params) => {
                Box::new(NonParametricBootstrap::new(params.clone()))
            }
            QuantileStrategy::MultiplierBootstrap { params, multiplier } => {
                Box::new(MultiplierBootstrap::new(params.clone(), *multiplier))
            }
        })
    }

    /// Critical value for a normalized residual field
    #[instrument(skip(self, field), fields(method = %self.method(), alpha = self.alpha, grid = %field.grid(), n = field.n()))]
    pub fn quantile(&self, field: &NormalizedField, df: f64) -> Result<f64> {
        let estimator = self.estimator(df)?;
        let q = estimator.critical_value(field, self.alpha)?;
        debug!(q, "critical value");
        Ok(q)
    }
}

/// Check a confidence level and return `alpha = 1 - level`
pub fn validate_level(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(Error::InvalidParameter(format!(
            "level must be in (0, 1), got {level}"
        )));
    }
    Ok(1.0 - level)
}

fn validate_l0(l0: Option<f64>) -> Result<f64> {
    match l0 {
        None => Ok(DEFAULT_L0),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v),
        Some(v) => Err(Error::InvalidParameter(format!(
            "L0 must be a non-negative integer, got {v}"
        ))),
    }
}

fn validate_mboots(mboots: Option<f64>) -> Result<usize> {
    match mboots {
        None => Ok(DEFAULT_MBOOTS),
        Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 && v <= usize::MAX as f64 => {
            Ok(v as usize)
        }
        Some(v) => Err(Error::InvalidParameter(format!(
            "Mboots must be a positive integer, got {v}"
        ))),
    }
}

/// Validate and default everything a quantile method needs
///
/// Performs no numeric work on data. Options that do not apply to the
/// chosen method are ignored with a warning.
#[instrument(skip(options))]
pub fn resolve_quantile_config(
    method: &str,
    level: f64,
    options: &QuantileOptions,
) -> Result<QuantileConfig> {
    let alpha = validate_level(level)?;
    let method: QuantileMethod = method.parse()?;

    let strategy = if method.is_gkf_family() {
        let l0 = validate_l0(options.l0)?;
        let ignored: Vec<&str> = [
            ("mboots", options.mboots.is_some()),
            ("seed", options.seed.is_some()),
            ("bootstrap", options.bootstrap.is_some()),
            ("multiplier", options.multiplier.is_some()),
            ("execution", options.execution.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        if !ignored.is_empty() {
            warn!(%method, ?ignored, "options ignored by the GKF family");
        }

        let estimator = options
            .lkc_estimator
            .clone()
            .unwrap_or_else(|| Arc::new(DirectLkc));
        match method {
            QuantileMethod::TGkf => QuantileStrategy::TGkf { l0, estimator },
            _ => QuantileStrategy::Gkf { l0, estimator },
        }
    } else {
        let mboots = validate_mboots(options.mboots)?;
        if options.l0.is_some() || options.lkc_estimator.is_some() {
            warn!(%method, "L0 and curvature estimator are ignored by bootstrap methods");
        }
        if method == QuantileMethod::NonParametricBootstrap && options.multiplier.is_some() {
            warn!(%method, "multiplier kind is ignored by the nonparametric bootstrap");
        }

        let seed = options.seed.unwrap_or_else(|| {
            let seed: u64 = rand::thread_rng().gen();
            debug!(seed, "no seed supplied, drew one");
            seed
        });
        let params = BootstrapParams {
            mboots,
            seed,
            variant: options.bootstrap.unwrap_or_default(),
            execution: options.execution.unwrap_or_default(),
            cancellation: options.cancellation.clone().unwrap_or_default(),
        };
        match method {
            QuantileMethod::NonParametricBootstrap => QuantileStrategy::NonParametricBootstrap(params),
            _ => QuantileStrategy::MultiplierBootstrap {
                params,
                multiplier: options.multiplier.unwrap_or_default(),
            },
        }
    };

    Ok(QuantileConfig { strategy, alpha })
}
