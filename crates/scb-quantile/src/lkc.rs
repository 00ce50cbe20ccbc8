//! Lipschitz-Killing curvature estimation from residual fields
//!
//! The curvatures of the domain in the metric induced by a unit-variance
//! field are estimated from the residuals themselves: at every grid point
//! the residual vector across realizations is scaled to unit length, and the
//! geometry of the resulting point cloud on the sphere stands in for the
//! induced Riemannian metric.

use scb_core::{Error, GridDims, NormalizedField, Result};
use nalgebra::DMatrix;
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Estimates `L_1..L_D` of the grid domain from a normalized residual field
///
/// Implementations must return exactly `D` values for a `D`-dimensional
/// grid. Any two-sample subdivision is already encoded in the field's group
/// weighting, so estimators may treat all realizations alike.
pub trait CurvatureEstimator: Debug + Send + Sync {
    /// Estimate the curvatures of positive order
    fn estimate(&self, field: &NormalizedField) -> Result<Vec<f64>>;

    /// Estimator name for logs
    fn name(&self) -> &'static str;
}

/// Discrete estimator of Taylor and Worsley
///
/// 1-D: `L_1` is the length of the polygon traced by the unit-length
/// residual vectors. 2-D: each grid cell is split into two triangles,
/// `L_2` is their total area (Heron's formula on the induced edge lengths)
/// and `L_1` is half the induced length of the grid boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectLkc;

impl DirectLkc {
    pub fn new() -> Self {
        Self
    }
}

impl CurvatureEstimator for DirectLkc {
    #[instrument(skip(self, field), fields(grid = %field.grid(), n = field.n()))]
    fn estimate(&self, field: &NormalizedField) -> Result<Vec<f64>> {
        let unit = unit_residuals(field.data())?;
        let lkc = match field.grid() {
            GridDims::OneD(k) => {
                let l1 = (1..k).map(|p| edge_length(&unit, p - 1, p)).sum::<f64>();
                vec![l1]
            }
            GridDims::TwoD(k1, k2) => {
                let grid = field.grid();
                let mut area = 0.0;
                for i in 0..k1.saturating_sub(1) {
                    for j in 0..k2.saturating_sub(1) {
                        let a = grid.index_2d(i, j);
                        let b = grid.index_2d(i + 1, j);
                        let c = grid.index_2d(i, j + 1);
                        let d = grid.index_2d(i + 1, j + 1);
                        area += triangle_area(&unit, a, b, c);
                        area += triangle_area(&unit, b, d, c);
                    }
                }

                let mut boundary = 0.0;
                for j in 1..k2 {
                    boundary += edge_length(&unit, grid.index_2d(0, j - 1), grid.index_2d(0, j));
                    boundary += edge_length(
                        &unit,
                        grid.index_2d(k1 - 1, j - 1),
                        grid.index_2d(k1 - 1, j),
                    );
                }
                for i in 1..k1 {
                    boundary += edge_length(&unit, grid.index_2d(i - 1, 0), grid.index_2d(i, 0));
                    boundary += edge_length(
                        &unit,
                        grid.index_2d(i - 1, k2 - 1),
                        grid.index_2d(i, k2 - 1),
                    );
                }
                vec![0.5 * boundary, area]
            }
        };
        debug!(?lkc, "estimated Lipschitz-Killing curvatures");
        Ok(lkc)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Scale every row of the field to unit Euclidean length
fn unit_residuals(data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let mut unit = data.clone();
    for p in 0..unit.nrows() {
        let norm = unit.row(p).norm();
        if norm <= 0.0 || !norm.is_finite() {
            return Err(Error::numerical(
                "curvature",
                format!("residuals vanish at grid point {p}"),
            ));
        }
        unit.row_mut(p).unscale_mut(norm);
    }
    Ok(unit)
}

fn edge_length(unit: &DMatrix<f64>, a: usize, b: usize) -> f64 {
    (unit.row(a) - unit.row(b)).norm()
}

fn triangle_area(unit: &DMatrix<f64>, a: usize, b: usize, c: usize) -> f64 {
    let x = edge_length(unit, a, b);
    let y = edge_length(unit, b, c);
    let z = edge_length(unit, a, c);
    let s = 0.5 * (x + y + z);
    (s * (s - x) * (s - y) * (s - z)).max(0.0).sqrt()
}

/// Full LKC vector `[L_0, L_1, .., L_D]` for a normalized field
///
/// `L_0` is supplied by the caller (the Euler characteristic of the domain);
/// the remaining entries come from `estimator` and are checked for length
/// and clipped at zero.
pub fn estimate_lkc(
    field: &NormalizedField,
    estimator: &dyn CurvatureEstimator,
    l0: f64,
) -> Result<Vec<f64>> {
    let dim = field.grid().dimension();
    let estimated = estimator.estimate(field)?;
    if estimated.len() != dim {
        return Err(Error::numerical(
            "curvature",
            format!(
                "{} estimator returned {} curvatures for a {dim}-dimensional grid",
                estimator.name(),
                estimated.len()
            ),
        ));
    }
    if estimated.iter().any(|l| !l.is_finite()) {
        return Err(Error::numerical(
            "curvature",
            format!("{} estimator returned non-finite curvatures {estimated:?}", estimator.name()),
        ));
    }
    let mut lkc = Vec::with_capacity(dim + 1);
    lkc.push(l0);
    lkc.extend(estimated.into_iter().map(|l| l.max(0.0)));
    Ok(lkc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scb_core::ResidualField;
    use std::f64::consts::PI;

    /// Residuals whose unit vectors rotate along a great circle at a known rate
    fn rotating_field(k: usize, total_angle: f64) -> NormalizedField {
        let n = 4;
        let data = DMatrix::from_fn(k, n, |p, col| {
            let theta = total_angle * p as f64 / (k - 1) as f64;
            match col {
                0 => theta.cos(),
                1 => -theta.cos(),
                2 => theta.sin(),
                _ => -theta.sin(),
            }
        });
        ResidualField::new(GridDims::OneD(k), data)
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_one_dimensional_length() {
        // Arc length on the unit sphere equals the total rotation angle;
        // chords underestimate it by O(h^2).
        let field = rotating_field(200, PI / 2.0);
        let lkc = DirectLkc.estimate(&field).unwrap();
        assert_eq!(lkc.len(), 1);
        assert_relative_eq!(lkc[0], PI / 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_single_point_has_zero_length() {
        let data = DMatrix::from_row_slice(1, 3, &[1.0, -1.0, 0.5]);
        let field = ResidualField::new(GridDims::OneD(1), data).unwrap().normalize().unwrap();
        let lkc = estimate_lkc(&field, &DirectLkc, 1.0).unwrap();
        assert_eq!(lkc, vec![1.0, 0.0]);
    }

    #[test]
    fn test_two_dimensional_flat_patch() {
        // Residual vectors u(i, j) = normalize(e0 + a*i*e1 + a*j*e2) are close
        // to a flat patch for small a: area ~ (a*(K-1))^2, L1 ~ 2*a*(K-1).
        let k = 21;
        let a = 0.0005;
        let grid = GridDims::TwoD(k, k);
        let data = DMatrix::from_fn(k * k, 6, |p, col| {
            let (i, j) = ((p / k) as f64, (p % k) as f64);
            let v = [1.0, a * i, a * j];
            if col < 3 {
                v[col]
            } else {
                -v[col - 3]
            }
        });
        let field = ResidualField::new(grid, data).unwrap().normalize().unwrap();
        let lkc = DirectLkc.estimate(&field).unwrap();
        let side = a * (k - 1) as f64;
        assert_eq!(lkc.len(), 2);
        assert_relative_eq!(lkc[0], 2.0 * side, max_relative = 1e-3);
        assert_relative_eq!(lkc[1], side * side, max_relative = 1e-3);
    }

    #[test]
    fn test_degenerate_strip_is_a_line() {
        let line = rotating_field(50, 1.0);
        let strip_data = line.data().clone();
        let strip = ResidualField::new(GridDims::TwoD(1, 50), strip_data)
            .unwrap()
            .normalize()
            .unwrap();
        let l_line = DirectLkc.estimate(&line).unwrap();
        let l_strip = DirectLkc.estimate(&strip).unwrap();
        assert_relative_eq!(l_strip[0], l_line[0], epsilon = 1e-12);
        assert_relative_eq!(l_strip[1], 0.0);
    }

    #[derive(Debug)]
    struct WrongLength;

    impl CurvatureEstimator for WrongLength {
        fn estimate(&self, _field: &NormalizedField) -> Result<Vec<f64>> {
            Ok(vec![1.0, 2.0])
        }

        fn name(&self) -> &'static str {
            "wrong-length"
        }
    }

    #[test]
    fn test_estimate_lkc_checks_length() {
        let field = rotating_field(10, 1.0);
        let err = estimate_lkc(&field, &WrongLength, 1.0).unwrap_err();
        assert!(matches!(err, Error::Numerical { .. }));
    }
}
