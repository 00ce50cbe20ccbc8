//! Euler-characteristic densities and the GKF tail-quantile solver
//!
//! The expected Euler characteristic of the excursion set above `u` of a
//! smooth unit-variance field over a domain with Lipschitz-Killing
//! curvatures `L_0..L_D` is `sum_j L_j rho_j(u)`. For high `u` this is an
//! accurate approximation of `P(sup X > u)`, and the two-sided critical
//! value solves `sum_j L_j rho_j(q) = alpha / 2`.

use scb_core::{Error, Result};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Highest domain dimension with implemented densities
pub const MAX_DIMENSION: usize = 2;

const ROOT_TOLERANCE: f64 = 1e-10;
const MAX_BISECTIONS: usize = 200;
const MAX_UPPER_BRACKET: f64 = 1e6;

/// Marginal law of the limiting field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Gaussian field
    Gauss,
    /// Student-t field with `df` degrees of freedom
    StudentT { df: f64 },
}

impl FieldKind {
    /// Student-t field, `df >= 1`
    pub fn student_t(df: f64) -> Result<Self> {
        if !df.is_finite() || df < 1.0 {
            return Err(Error::InvalidParameter(format!(
                "t-field degrees of freedom must be >= 1, got {df}"
            )));
        }
        Ok(FieldKind::StudentT { df })
    }

    /// `j`-th Euler-characteristic density at level `u`, `j <= 2`
    pub fn density(&self, j: usize, u: f64) -> f64 {
        match *self {
            FieldKind::Gauss => {
                let phi = (-0.5 * u * u).exp();
                match j {
                    0 => standard_normal_sf(u),
                    1 => phi / (2.0 * PI),
                    2 => u * phi / (2.0 * PI).powf(1.5),
                    _ => f64::NAN,
                }
            }
            FieldKind::StudentT { df } => {
                // (1 + u^2/df)^(-(df - 1)/2), via log1p to stay finite for large u
                let decay = (-(df - 1.0) / 2.0 * (u * u / df).ln_1p()).exp();
                match j {
                    0 => student_t_sf(u, df),
                    1 => decay / (2.0 * PI),
                    2 => {
                        let ratio =
                            (ln_gamma((df + 1.0) / 2.0) - ln_gamma(df / 2.0)).exp() / (df / 2.0).sqrt();
                        ratio * u * decay / (2.0 * PI).powf(1.5)
                    }
                    _ => f64::NAN,
                }
            }
        }
    }

    /// Expected Euler characteristic `sum_j L_j rho_j(u)`
    pub fn tail(&self, u: f64, lkc: &[f64]) -> f64 {
        lkc.iter()
            .enumerate()
            .map(|(j, &l)| if l == 0.0 { 0.0 } else { l * self.density(j, u) })
            .sum()
    }

    /// Smallest `q >= 0` with `tail(q, lkc) = alpha / 2`
    ///
    /// Negative curvatures are clipped to zero. If every curvature is zero
    /// there is no excursion probability to invert and a numerical error is
    /// returned; if only `L_0` is positive the result is the pointwise
    /// two-sided critical value. When `tail(0)` is already at most `alpha / 2`
    /// (possible with `L_0 = 0`) the quantile is 0.
    pub fn quantile(&self, lkc: &[f64], alpha: f64) -> Result<f64> {
        if lkc.is_empty() || lkc.len() > MAX_DIMENSION + 1 {
            return Err(Error::InvalidParameter(format!(
                "LKC vector must have between 1 and {} entries, got {}",
                MAX_DIMENSION + 1,
                lkc.len()
            )));
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "alpha must be in (0, 1), got {alpha}"
            )));
        }

        let lkc = clip_curvatures(lkc)?;
        let target = alpha / 2.0;
        let f = |u: f64| self.tail(u, &lkc) - target;

        let f_lo = f(0.0);
        if f_lo <= 0.0 {
            let tail = f_lo + target;
            debug!(kind = ?self, ?lkc, alpha, tail, "tail at 0 already below alpha/2");
            return Ok(0.0);
        }

        let mut hi = 1.0;
        while f(hi) > 0.0 {
            hi *= 2.0;
            if hi > MAX_UPPER_BRACKET {
                return Err(Error::numerical(
                    "root-find",
                    format!("failed to bracket a root for LKC {lkc:?} and alpha {alpha}"),
                ));
            }
        }

        let mut lo = 0.0;
        for _ in 0..MAX_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            if f(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < ROOT_TOLERANCE {
                break;
            }
        }
        let q = 0.5 * (lo + hi);
        debug!(kind = ?self, ?lkc, alpha, q, "solved GKF tail equation");
        Ok(q)
    }
}

fn clip_curvatures(lkc: &[f64]) -> Result<Vec<f64>> {
    if lkc.iter().any(|l| l.is_nan()) {
        return Err(Error::numerical("curvature", "LKC vector contains NaN"));
    }
    let clipped: Vec<f64> = lkc.iter().map(|&l| l.max(0.0)).collect();
    if clipped.iter().zip(lkc).any(|(c, l)| c != l) {
        warn!(?lkc, "negative Lipschitz-Killing curvatures clipped to zero");
    }
    if clipped.iter().all(|&l| l == 0.0) {
        return Err(Error::numerical(
            "curvature",
            "all Lipschitz-Killing curvatures are zero",
        ));
    }
    Ok(clipped)
}

fn standard_normal_sf(u: f64) -> f64 {
    // Normal::new(0, 1) cannot fail; symmetry keeps precision in the upper tail
    Normal::new(0.0, 1.0).map(|n| n.cdf(-u)).unwrap_or(f64::NAN)
}

fn student_t_sf(u: f64, df: f64) -> f64 {
    StudentsT::new(0.0, 1.0, df)
        .map(|t| t.cdf(-u))
        .unwrap_or(f64::NAN)
}
