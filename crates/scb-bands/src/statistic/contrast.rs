//! Pointwise linear-model contrasts
//!
//! Every grid point is fitted by ordinary least squares against the same
//! `N x p` design matrix `X`, and the band covers `c' beta(t)`.

use super::{Statistic, StatisticOutput};
use crate::band::{Band, ScbResult};
use crate::smoothing::LocalLinearSmoother;
use nalgebra::{DMatrix, DVector};
use scb_core::math::{interpolate_linear, is_strictly_increasing};
use scb_core::{Error, FunctionalSample, GridDims, ResidualField, Result};
use std::borrow::Cow;

/// Grid handling for a contrast band
#[derive(Debug, Clone, Default)]
pub enum ContrastGrid {
    /// Band on the observation grid
    #[default]
    Raw,
    /// Map the sample through `weights` (evaluation points x grid points)
    /// before fitting; the band lives on the evaluation grid
    Smoothed { weights: DMatrix<f64> },
    /// Fit on observation grid `x`, then interpolate onto `dense` (1-D only)
    Interpolated { x: Vec<f64>, dense: Vec<f64> },
}

impl ContrastGrid {
    /// Local-linear smoothing from observation grid `x` onto `eval`
    pub fn local_linear(smoother: &LocalLinearSmoother, x: &[f64], eval: &[f64]) -> Result<Self> {
        Ok(ContrastGrid::Smoothed {
            weights: smoother.weights(x, eval)?,
        })
    }
}

/// `c' beta(t)` from pointwise OLS
#[derive(Debug, Clone)]
pub struct LinearContrast<'a> {
    sample: &'a FunctionalSample,
    design: &'a DMatrix<f64>,
    contrast: &'a DVector<f64>,
    grid: ContrastGrid,
}

impl<'a> LinearContrast<'a> {
    pub fn new(
        sample: &'a FunctionalSample,
        design: &'a DMatrix<f64>,
        contrast: &'a DVector<f64>,
        grid: ContrastGrid,
    ) -> Self {
        Self {
            sample,
            design,
            contrast,
            grid,
        }
    }

    /// Sample on the grid the model is fitted on
    fn fitted_data(&self) -> Cow<'a, DMatrix<f64>> {
        match &self.grid {
            ContrastGrid::Smoothed { weights } => Cow::Owned(weights * self.sample.data()),
            _ => Cow::Borrowed(self.sample.data()),
        }
    }
}

impl Statistic for LinearContrast<'_> {
    fn name(&self) -> &'static str {
        "linear contrast"
    }

    fn grid(&self) -> GridDims {
        match &self.grid {
            ContrastGrid::Smoothed { weights } => GridDims::OneD(weights.nrows()),
            _ => self.sample.grid(),
        }
    }

    fn validate(&self) -> Result<()> {
        let n = self.sample.n();
        let p = self.design.ncols();
        if self.design.nrows() != n {
            return Err(Error::size_mismatch(n, self.design.nrows(), "design matrix rows"));
        }
        if self.contrast.len() != p {
            return Err(Error::size_mismatch(p, self.contrast.len(), "contrast vector"));
        }
        if p == 0 || n <= p {
            return Err(Error::shape(format!(
                "need more realizations than regressors, got N = {n} and p = {p}"
            )));
        }
        if self.design.iter().chain(self.contrast.iter()).any(|v| !v.is_finite()) {
            return Err(Error::non_finite("design matrix or contrast"));
        }

        match &self.grid {
            ContrastGrid::Raw => {}
            ContrastGrid::Smoothed { weights } => {
                if weights.ncols() != self.sample.points() {
                    return Err(Error::size_mismatch(
                        self.sample.points(),
                        weights.ncols(),
                        "smoothing weight columns",
                    ));
                }
                if weights.nrows() == 0 || weights.iter().any(|w| !w.is_finite()) {
                    return Err(Error::shape("smoothing weights must be non-empty and finite"));
                }
            }
            ContrastGrid::Interpolated { x, dense } => {
                if self.sample.grid() != GridDims::OneD(x.len()) {
                    return Err(Error::shape(format!(
                        "interpolation needs a 1-D sample on {} points, got grid {}",
                        x.len(),
                        self.sample.grid()
                    )));
                }
                if !is_strictly_increasing(x) || dense.is_empty() || !is_strictly_increasing(dense) {
                    return Err(Error::shape(
                        "observation and output grids must be strictly increasing",
                    ));
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self) -> Result<StatisticOutput> {
        let x = self.design;
        let (n, p) = x.shape();
        let xtx_inv = (x.transpose() * x).try_inverse().ok_or_else(|| {
            Error::shape("design matrix is rank deficient: X'X is singular")
        })?;

        let fitted = self.fitted_data();
        let y: &DMatrix<f64> = &fitted;
        let beta = y * x * &xtx_inv;
        let estimate = &beta * self.contrast;
        let resid = y - &beta * x.transpose();

        let dof = (n - p) as f64;
        let leverage = (self.contrast.transpose() * &xtx_inv * self.contrast)[(0, 0)];
        let se = (0..resid.nrows())
            .map(|t| {
                let sigma2 = resid.row(t).norm_squared() / dof;
                (leverage * sigma2).sqrt()
            })
            .collect();

        Ok(StatisticOutput {
            estimate: estimate.iter().copied().collect(),
            residuals: ResidualField::new(self.grid(), resid)?,
            se,
            df: dof,
            bias: 1.0,
        })
    }

    fn finalize(&self, result: ScbResult) -> Result<ScbResult> {
        let ContrastGrid::Interpolated { x, dense } = &self.grid else {
            return Ok(result);
        };
        let band = Band::new(
            interpolate_linear(x, result.lower(), dense),
            interpolate_linear(x, result.upper(), dense),
        )?;
        Ok(ScbResult {
            estimate: interpolate_linear(x, &result.estimate, dense),
            se: interpolate_linear(x, &result.se, dense),
            band,
            grid: GridDims::OneD(dense.len()),
            coordinates: Some(dense.clone()),
            ..result
        })
    }
}
