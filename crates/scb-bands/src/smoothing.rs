//! Local-linear kernel smoothing of functional samples

use nalgebra::DMatrix;
use scb_core::math::is_strictly_increasing;
use scb_core::{Error, FunctionalSample, GridDims, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, instrument};

/// Smoothing kernel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Gaussian,
    #[default]
    Epanechnikov,
}

impl Kernel {
    pub fn value(&self, u: f64) -> f64 {
        match self {
            Kernel::Gaussian => (-0.5 * u * u).exp() / (2.0 * PI).sqrt(),
            Kernel::Epanechnikov => {
                if u.abs() <= 1.0 {
                    0.75 * (1.0 - u * u)
                } else {
                    0.0
                }
            }
        }
    }
}

/// Local-linear smoother with a fixed bandwidth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalLinearSmoother {
    bandwidth: f64,
    kernel: Kernel,
}

impl LocalLinearSmoother {
    pub fn new(bandwidth: f64) -> Result<Self> {
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "bandwidth must be positive, got {bandwidth}"
            )));
        }
        Ok(Self {
            bandwidth,
            kernel: Kernel::default(),
        })
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Weight matrix `W` (evaluation points x observation points)
    ///
    /// Row `m` holds `w_i = K_i (S2 - d_i S1) / (S0 S2 - S1^2)` with
    /// `d_i = x_i - t_m`. Where fewer than two observations fall in the
    /// kernel window the row degrades to Nadaraya-Watson weights.
    pub fn weights(&self, x: &[f64], eval: &[f64]) -> Result<DMatrix<f64>> {
        if !is_strictly_increasing(x) {
            return Err(Error::InvalidParameter(
                "observation grid must be finite and strictly increasing".to_string(),
            ));
        }
        if eval.is_empty() || eval.iter().any(|t| !t.is_finite()) {
            return Err(Error::InvalidParameter(
                "evaluation grid must be non-empty and finite".to_string(),
            ));
        }

        let h = self.bandwidth;
        let mut w = DMatrix::zeros(eval.len(), x.len());
        for (m, &t) in eval.iter().enumerate() {
            let k: Vec<f64> = x.iter().map(|&xi| self.kernel.value((xi - t) / h) / h).collect();
            let (mut s0, mut s1, mut s2) = (0.0, 0.0, 0.0);
            for (&ki, &xi) in k.iter().zip(x) {
                let d = xi - t;
                s0 += ki;
                s1 += ki * d;
                s2 += ki * d * d;
            }

            let denom = s0 * s2 - s1 * s1;
            if denom.abs() > 1e-15 {
                for (i, (&ki, &xi)) in k.iter().zip(x).enumerate() {
                    w[(m, i)] = ki * (s2 - s1 * (xi - t)) / denom;
                }
            } else if s0 > 0.0 {
                for (i, &ki) in k.iter().enumerate() {
                    w[(m, i)] = ki / s0;
                }
            } else {
                return Err(Error::numerical(
                    "smoothing",
                    format!("no observations within bandwidth {h} of evaluation point {t}"),
                ));
            }
        }
        Ok(w)
    }

    /// Smooth every realization of a 1-D sample onto `eval`
    ///
    /// Returns the smoothed sample and the weight matrix that produced it.
    #[instrument(skip(self, x, sample, eval), fields(bandwidth = self.bandwidth, kernel = ?self.kernel, k = x.len(), m = eval.len()))]
    pub fn smooth(
        &self,
        x: &[f64],
        sample: &FunctionalSample,
        eval: &[f64],
    ) -> Result<(FunctionalSample, DMatrix<f64>)> {
        if sample.grid() != GridDims::OneD(x.len()) {
            return Err(Error::shape(format!(
                "local-linear smoothing needs a 1-D sample on {} points, got grid {}",
                x.len(),
                sample.grid()
            )));
        }
        let w = self.weights(x, eval)?;
        let smoothed = &w * sample.data();
        debug!("smoothed {} realizations", sample.n());
        Ok((FunctionalSample::from_matrix(GridDims::OneD(eval.len()), smoothed)?, w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(k: usize) -> Vec<f64> {
        (0..k).map(|i| i as f64 / (k - 1) as f64).collect()
    }

    #[test]
    fn test_kernels() {
        assert_relative_eq!(Kernel::Epanechnikov.value(0.0), 0.75);
        assert_eq!(Kernel::Epanechnikov.value(1.5), 0.0);
        assert_relative_eq!(Kernel::Gaussian.value(0.0), 1.0 / (2.0 * PI).sqrt());
        assert_eq!(Kernel::default(), Kernel::Epanechnikov);
    }

    #[test]
    fn test_weights_reproduce_linear_functions() {
        let x = grid(30);
        let eval = grid(17);
        for kernel in [Kernel::Gaussian, Kernel::Epanechnikov] {
            let w = LocalLinearSmoother::new(0.15).unwrap().with_kernel(kernel).weights(&x, &eval).unwrap();
            for m in 0..eval.len() {
                let row_sum: f64 = w.row(m).iter().sum();
                let first_moment: f64 = w.row(m).iter().zip(&x).map(|(wi, xi)| wi * xi).sum();
                assert_relative_eq!(row_sum, 1.0, epsilon = 1e-10);
                assert_relative_eq!(first_moment, eval[m], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_smooth_sample() {
        let x = grid(40);
        let curves: Vec<Vec<f64>> = (0..3)
            .map(|n| x.iter().map(|t| 2.0 * t + n as f64).collect())
            .collect();
        let sample = FunctionalSample::from_curves(&curves).unwrap();
        let eval = vec![0.25, 0.5, 0.75];
        let (smoothed, w) = LocalLinearSmoother::new(0.1).unwrap().smooth(&x, &sample, &eval).unwrap();
        assert_eq!(w.shape(), (3, 40));
        assert_eq!(smoothed.grid(), GridDims::OneD(3));
        assert_relative_eq!(smoothed.data()[(1, 2)], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_smoothing() {
        assert!(LocalLinearSmoother::new(0.0).is_err());
        let smoother = LocalLinearSmoother::new(0.01).unwrap();
        assert!(smoother.weights(&[0.0, 0.0, 1.0], &[0.5]).is_err());
        // Epanechnikov window around 0.5 contains no observation
        assert!(matches!(
            smoother.weights(&[0.0, 1.0], &[0.5]),
            Err(Error::Numerical { .. })
        ));
    }
}
