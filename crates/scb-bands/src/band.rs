//! Simultaneous bands and band results

use scb_core::{Error, GridDims, NormalizedField, Result};
use scb_quantile::QuantileMethod;
use std::fmt;

/// Lower and upper band limits, one pair per grid point
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Band {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(Error::size_mismatch(lower.len(), upper.len(), "band limits"));
        }
        if lower.iter().zip(&upper).any(|(l, u)| !(l <= u)) {
            return Err(Error::numerical("band", "lower limit exceeds upper limit"));
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Pointwise width `upper - lower`
    pub fn width(&self) -> Vec<f64> {
        self.lower.iter().zip(&self.upper).map(|(l, u)| u - l).collect()
    }

    /// Whether the whole curve lies inside the band
    pub fn contains(&self, curve: &[f64]) -> bool {
        curve.len() == self.len()
            && curve
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(v, (l, u))| l <= v && v <= u)
    }
}

/// Builds `[estimate - q * se, estimate + q * se]`
#[derive(Debug, Clone, Copy)]
pub struct BandBuilder {
    quantile: f64,
}

impl BandBuilder {
    /// Builder for critical value `q`, which must be finite and non-negative
    pub fn new(quantile: f64) -> Result<Self> {
        if !(quantile >= 0.0 && quantile.is_finite()) {
            return Err(Error::numerical(
                "band",
                format!("critical value must be finite and non-negative, got {quantile}"),
            ));
        }
        Ok(Self { quantile })
    }

    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    pub fn build(&self, estimate: &[f64], se: &[f64]) -> Result<Band> {
        if estimate.len() != se.len() {
            return Err(Error::size_mismatch(estimate.len(), se.len(), "standard error field"));
        }
        if se.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(Error::numerical(
                "band",
                "standard errors must be finite and non-negative",
            ));
        }
        if estimate.iter().any(|e| !e.is_finite()) {
            return Err(Error::numerical("band", "estimate contains NaN or infinite values"));
        }
        let (lower, upper) = estimate
            .iter()
            .zip(se)
            .map(|(e, s)| (e - self.quantile * s, e + self.quantile * s))
            .unzip();
        Band::new(lower, upper)
    }
}

/// Simultaneous confidence band with the quantities it was built from
#[derive(Debug, Clone)]
pub struct ScbResult {
    /// Point estimate, including any bias correction
    pub estimate: Vec<f64>,
    pub band: Band,
    pub level: f64,
    /// Critical value `q`
    pub quantile: f64,
    pub method: QuantileMethod,
    /// Pointwise standard error
    pub se: Vec<f64>,
    /// Degrees of freedom of the statistic
    pub df: f64,
    /// Grid of the estimate and band
    pub grid: GridDims,
    /// Output coordinates when the band was interpolated onto a dense grid
    pub coordinates: Option<Vec<f64>>,
    /// Normalized residuals the critical value was estimated from
    pub residuals: NormalizedField,
}

impl ScbResult {
    pub fn lower(&self) -> &[f64] {
        self.band.lower()
    }

    pub fn upper(&self) -> &[f64] {
        self.band.upper()
    }

    /// Pointwise half-width `q * se`
    pub fn half_width(&self) -> Vec<f64> {
        self.band.width().into_iter().map(|w| 0.5 * w).collect()
    }

    /// Whether `truth` lies inside the band at every grid point
    pub fn covers(&self, truth: &[f64]) -> bool {
        self.band.contains(truth)
    }
}

impl fmt::Display for ScbResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max_width = self.band.width().into_iter().fold(0.0, f64::max);
        write!(
            f,
            "{:.1}% SCB ({}) on grid {}: q = {:.4}, df = {}, max width = {:.4}",
            self.level * 100.0,
            self.method,
            self.grid,
            self.quantile,
            self.df,
            max_width
        )
    }
}
