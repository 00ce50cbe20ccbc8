//! Bootstrap critical values for the maximum of a residual field
//!
//! Both strategies approximate the law of `max_p |T*(p)|` by `Mboots`
//! independent replicates and return its empirical `1 - alpha` quantile
//! (Hyndman-Fan type 8). Replicate `i` draws from its own generator seeded
//! with `seed + i`, so results do not depend on scheduling and sequential
//! and parallel runs agree bit for bit.

use crate::config::{BootstrapVariant, MultiplierKind};
use crate::traits::QuantileEstimator;
use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand_distr::StandardNormal;
use scb_core::math::empirical_quantile;
use scb_core::{CancellationToken, Error, ExecutionStrategy, NormalizedField, Result};
use tracing::{debug, instrument};

/// Parameters shared by the bootstrap strategies
#[derive(Debug, Clone)]
pub struct BootstrapParams {
    /// Number of resamples
    pub mboots: usize,
    /// Base seed; replicate `i` uses `seed.wrapping_add(i)`
    pub seed: u64,
    pub variant: BootstrapVariant,
    pub execution: ExecutionStrategy,
    pub cancellation: CancellationToken,
}

impl BootstrapParams {
    pub fn new(mboots: usize, seed: u64) -> Self {
        Self {
            mboots,
            seed,
            variant: BootstrapVariant::default(),
            execution: ExecutionStrategy::default(),
            cancellation: CancellationToken::default(),
        }
    }

    pub fn with_variant(mut self, variant: BootstrapVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = execution;
        self
    }

    fn rng(&self, replicate: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(replicate as u64))
    }

    /// The upper tail must hold at least one replicate
    fn check_resolution(&self, method: &str, alpha: f64) -> Result<()> {
        if (self.mboots as f64) * alpha < 1.0 {
            return Err(Error::numerical(
                format!("{method}/resolution"),
                format!(
                    "{} resamples cannot resolve the {} quantile; need at least {}",
                    self.mboots,
                    1.0 - alpha,
                    (1.0 / alpha).ceil()
                ),
            ));
        }
        Ok(())
    }
}

/// `numerator / sd`, with a vanishing scale mapped to 0 or infinity
#[inline]
fn studentize(numerator: f64, sd: f64) -> f64 {
    if sd > 0.0 {
        numerator / sd
    } else if numerator == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

fn max_quantile(method: &str, maxima: &[f64], alpha: f64) -> Result<f64> {
    let q = empirical_quantile(maxima, 1.0 - alpha)
        .ok_or_else(|| Error::numerical(format!("{method}/quantile"), "no bootstrap replicates"))?;
    if !q.is_finite() {
        return Err(Error::numerical(
            format!("{method}/quantile"),
            "bootstrap distribution of the maximum is degenerate",
        ));
    }
    Ok(q)
}

/// Resampling realizations with replacement
///
/// Realizations are drawn within their subdivision group, so stacked
/// two-sample fields keep their group sizes. The `t` variant studentizes
/// every replicate by its own pointwise standard deviation; `regular`
/// divides by the standard deviation of the original field.
#[derive(Debug, Clone)]
pub struct NonParametricBootstrap {
    params: BootstrapParams,
}

impl NonParametricBootstrap {
    pub fn new(params: BootstrapParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BootstrapParams {
        &self.params
    }

    /// All replicate maxima, in replicate order
    pub fn maxima(&self, field: &NormalizedField) -> Result<Vec<f64>> {
        let data = field.data();
        let (points, n) = (data.nrows(), data.ncols());
        let nf = n as f64;
        let sqrt_n = nf.sqrt();
        let groups = field.groups();
        let variant = self.params.variant;

        let center: Vec<f64> = (0..points).map(|p| data.row(p).sum() / nf).collect();
        let sd: Vec<f64> = (0..points)
            .map(|p| {
                let ss: f64 = data.row(p).iter().map(|x| (x - center[p]).powi(2)).sum();
                (ss / (nf - 1.0)).sqrt()
            })
            .collect();

        self.params
            .execution
            .execute_batch(self.params.mboots, &self.params.cancellation, |i| {
                let mut rng = self.params.rng(i);
                let mut picks = Vec::with_capacity(n);
                for group in &groups {
                    for _ in group.clone() {
                        picks.push(rng.gen_range(group.clone()));
                    }
                }

                let mut max = 0.0f64;
                for p in 0..points {
                    let (mut sum, mut sum_sq) = (0.0, 0.0);
                    for &col in &picks {
                        let x = data[(p, col)];
                        sum += x;
                        sum_sq += x * x;
                    }
                    let mean = sum / nf;
                    let shift = sqrt_n * (mean - center[p]);
                    let t = match variant {
                        BootstrapVariant::T => {
                            let var = ((sum_sq - nf * mean * mean) / (nf - 1.0)).max(0.0);
                            studentize(shift, var.sqrt())
                        }
                        BootstrapVariant::Regular => studentize(shift, sd[p]),
                    };
                    max = max.max(t.abs());
                }
                max
            })
    }
}

impl QuantileEstimator for NonParametricBootstrap {
    #[instrument(skip(self, field), fields(mboots = self.params.mboots, seed = self.params.seed, variant = ?self.params.variant))]
    fn critical_value(&self, field: &NormalizedField, alpha: f64) -> Result<f64> {
        self.params.check_resolution(self.name(), alpha)?;
        debug!(
            "Running {} nonparametric resamples on {} threads",
            self.params.mboots,
            self.params.execution.num_threads()
        );
        let maxima = self.maxima(field)?;
        max_quantile(self.name(), &maxima, alpha)
    }

    fn name(&self) -> &'static str {
        "NonParametricBootstrap"
    }
}

/// Random multipliers on the residuals
///
/// `regular`: `T*(p) = sum_n g_n R(p, n) / sqrt(N - 1)`, which has unit
/// variance on a normalized field. `t`: the multiplied residuals `g_n R(p, n)`
/// are treated as a new sample and studentized by their own mean and
/// standard deviation.
#[derive(Debug, Clone)]
pub struct MultiplierBootstrap {
    params: BootstrapParams,
    multiplier: MultiplierKind,
}

impl MultiplierBootstrap {
    pub fn new(params: BootstrapParams, multiplier: MultiplierKind) -> Self {
        Self { params, multiplier }
    }

    pub fn params(&self) -> &BootstrapParams {
        &self.params
    }

    pub fn multiplier(&self) -> MultiplierKind {
        self.multiplier
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        match self.multiplier {
            MultiplierKind::Gaussian => rng.sample(StandardNormal),
            MultiplierKind::Rademacher => {
                if rng.gen::<bool>() {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// All replicate maxima, in replicate order
    pub fn maxima(&self, field: &NormalizedField) -> Result<Vec<f64>> {
        let data = field.data();
        let n = data.ncols();
        let nf = n as f64;
        let variant = self.params.variant;
        let squared: DMatrix<f64> = data.map(|x| x * x);
        let scale = (nf - 1.0).sqrt();

        self.params
            .execution
            .execute_batch(self.params.mboots, &self.params.cancellation, |i| {
                let mut rng = self.params.rng(i);
                let g = DVector::from_fn(n, |_, _| self.draw(&mut rng));
                let sums = data * &g;

                match variant {
                    BootstrapVariant::Regular => {
                        sums.iter().fold(0.0f64, |max, s| max.max((s / scale).abs()))
                    }
                    BootstrapVariant::T => {
                        let g_sq = g.component_mul(&g);
                        let sums_sq = &squared * &g_sq;
                        sums.iter()
                            .zip(sums_sq.iter())
                            .fold(0.0f64, |max, (s, s2)| {
                                let mean = s / nf;
                                let var = ((s2 / nf - mean * mean) * nf / (nf - 1.0)).max(0.0);
                                max.max(studentize(nf.sqrt() * mean, var.sqrt()).abs())
                            })
                    }
                }
            })
    }
}

impl QuantileEstimator for MultiplierBootstrap {
    #[instrument(skip(self, field), fields(mboots = self.params.mboots, seed = self.params.seed, variant = ?self.params.variant, multiplier = ?self.multiplier))]
    fn critical_value(&self, field: &NormalizedField, alpha: f64) -> Result<f64> {
        self.params.check_resolution(self.name(), alpha)?;
        debug!(
            "Running {} multiplier resamples on {} threads",
            self.params.mboots,
            self.params.execution.num_threads()
        );
        let maxima = self.maxima(field)?;
        max_quantile(self.name(), &maxima, alpha)
    }

    fn name(&self) -> &'static str {
        "MultiplierBootstrap"
    }
}
