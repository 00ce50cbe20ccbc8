//! Functional samples and residual fields on rectangular grids
//!
//! All field data is held in a `DMatrix<f64>` with one row per grid point
//! and one column per realization, so the realization axis is always the
//! last one. Two-dimensional grids are flattened row-major: point `(i, j)`
//! of a `K1 x K2` grid lives in row `i * K2 + j`.

use crate::{Error, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Shape of the spatial grid a field is observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridDims {
    /// `K` equally indexed points on a line
    OneD(usize),
    /// `K1 x K2` rectangular grid
    TwoD(usize, usize),
}

impl GridDims {
    /// Total number of grid points
    pub fn points(&self) -> usize {
        match *self {
            GridDims::OneD(k) => k,
            GridDims::TwoD(k1, k2) => k1 * k2,
        }
    }

    /// Dimension `D` of the domain
    pub fn dimension(&self) -> usize {
        match self {
            GridDims::OneD(_) => 1,
            GridDims::TwoD(_, _) => 2,
        }
    }

    /// Row index of grid point `(i, j)` on a 2-D grid
    #[inline]
    pub fn index_2d(&self, i: usize, j: usize) -> usize {
        match *self {
            GridDims::OneD(_) => i,
            GridDims::TwoD(_, k2) => i * k2 + j,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.points() == 0 {
            return Err(Error::shape("grid must contain at least one point"));
        }
        Ok(())
    }
}

impl fmt::Display for GridDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridDims::OneD(k) => write!(f, "{k}"),
            GridDims::TwoD(k1, k2) => write!(f, "{k1}x{k2}"),
        }
    }
}

/// `N` i.i.d. realizations of a random field over a grid
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionalSample {
    grid: GridDims,
    data: DMatrix<f64>,
}

impl FunctionalSample {
    /// Wrap a points-by-realizations matrix
    pub fn from_matrix(grid: GridDims, data: DMatrix<f64>) -> Result<Self> {
        grid.validate()?;
        if data.nrows() != grid.points() {
            return Err(Error::size_mismatch(grid.points(), data.nrows(), "sample grid rows"));
        }
        if data.ncols() < 2 {
            return Err(Error::too_few_realizations(2, data.ncols()));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(Error::non_finite("sample"));
        }
        Ok(Self { grid, data })
    }

    /// Build a sample from a list of realizations, each a full grid of values
    pub fn from_realizations(grid: GridDims, realizations: &[Vec<f64>]) -> Result<Self> {
        grid.validate()?;
        let points = grid.points();
        for (n, r) in realizations.iter().enumerate() {
            if r.len() != points {
                return Err(Error::shape(format!(
                    "realization {n} has {} values, grid {grid} has {points} points",
                    r.len()
                )));
            }
        }
        let data = DMatrix::from_fn(points, realizations.len(), |p, n| realizations[n][p]);
        Self::from_matrix(grid, data)
    }

    /// Build a 1-D sample from a list of curves
    pub fn from_curves(curves: &[Vec<f64>]) -> Result<Self> {
        let k = curves.first().map(|c| c.len()).unwrap_or(0);
        Self::from_realizations(GridDims::OneD(k), curves)
    }

    pub fn grid(&self) -> GridDims {
        self.grid
    }

    /// Number of realizations `N`
    pub fn n(&self) -> usize {
        self.data.ncols()
    }

    /// Number of grid points
    pub fn points(&self) -> usize {
        self.data.nrows()
    }

    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Pointwise sample mean
    pub fn pointwise_mean(&self) -> Vec<f64> {
        row_means(&self.data)
    }

    /// Pointwise sample variance with `N - 1` denominator
    pub fn pointwise_variance(&self, mean: &[f64]) -> Vec<f64> {
        let denom = (self.n() - 1) as f64;
        (0..self.points())
            .map(|p| {
                self.data
                    .row(p)
                    .iter()
                    .map(|&y| (y - mean[p]).powi(2))
                    .sum::<f64>()
                    / denom
            })
            .collect()
    }
}

fn group_ranges(subdivision: &[usize]) -> Vec<Range<usize>> {
    let mut start = 0;
    subdivision
        .iter()
        .map(|&end| {
            let range = start..end;
            start = end;
            range
        })
        .collect()
}

pub(crate) fn row_means(data: &DMatrix<f64>) -> Vec<f64> {
    let n = data.ncols() as f64;
    (0..data.nrows())
        .map(|p| data.row(p).iter().sum::<f64>() / n)
        .collect()
}

/// Residual field whose scaled law matches the pivot of a point estimate
///
/// Realizations may be split into consecutive groups (subdivision) when the
/// field stacks residuals of independent samples, e.g. `[N1, N1 + N2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualField {
    grid: GridDims,
    data: DMatrix<f64>,
    subdivision: Vec<usize>,
}

impl ResidualField {
    /// Residual field made of a single group
    pub fn new(grid: GridDims, data: DMatrix<f64>) -> Result<Self> {
        let n = data.ncols();
        Self::with_subdivision(grid, data, vec![n])
    }

    /// Residual field with group end indices, the last of which must equal `N`
    pub fn with_subdivision(
        grid: GridDims,
        data: DMatrix<f64>,
        subdivision: Vec<usize>,
    ) -> Result<Self> {
        grid.validate()?;
        if data.nrows() != grid.points() {
            return Err(Error::size_mismatch(grid.points(), data.nrows(), "residual grid rows"));
        }
        if subdivision.last() != Some(&data.ncols()) {
            return Err(Error::shape(format!(
                "subdivision {subdivision:?} must end at the number of realizations {}",
                data.ncols()
            )));
        }
        let mut start = 0;
        for &end in &subdivision {
            if end < start + 2 {
                return Err(Error::shape(format!(
                    "subdivision {subdivision:?} has a group with fewer than 2 realizations"
                )));
            }
            start = end;
        }
        Ok(Self {
            grid,
            data,
            subdivision,
        })
    }

    pub fn grid(&self) -> GridDims {
        self.grid
    }

    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Number of realizations across all groups
    pub fn n(&self) -> usize {
        self.data.ncols()
    }

    pub fn points(&self) -> usize {
        self.data.nrows()
    }

    pub fn subdivision(&self) -> &[usize] {
        &self.subdivision
    }

    /// Column ranges of the groups
    pub fn groups(&self) -> Vec<Range<usize>> {
        group_ranges(&self.subdivision)
    }

    /// Rescale the field to unit pointwise variance
    ///
    /// With more than one group, each group is first weighted by
    /// `1 / sqrt(N_g - 1)` so the pooled second moment is the sum of the
    /// group covariances. Afterwards every row satisfies
    /// `sum_n R(p, n)^2 = N - 1`.
    pub fn normalize(&self) -> Result<NormalizedField> {
        let mut data = self.data.clone();
        let groups = self.groups();
        if groups.len() > 1 {
            for range in &groups {
                let weight = 1.0 / ((range.len() - 1) as f64).sqrt();
                for n in range.clone() {
                    data.column_mut(n).scale_mut(weight);
                }
            }
        }

        let dof = (self.n() - 1) as f64;
        for p in 0..data.nrows() {
            let ss: f64 = data.row(p).iter().map(|x| x * x).sum();
            if ss <= 0.0 || !ss.is_finite() {
                return Err(Error::numerical(
                    "normalization",
                    format!("residual field has zero or non-finite variance at grid point {p}"),
                ));
            }
            let scale = (dof / ss).sqrt();
            data.row_mut(p).scale_mut(scale);
        }

        Ok(NormalizedField {
            grid: self.grid,
            data,
            subdivision: self.subdivision.clone(),
        })
    }
}

/// Residual field rescaled to unit pointwise variance
///
/// Only obtainable through [`ResidualField::normalize`], which makes the
/// normalization step impossible to skip before curvature or bootstrap
/// estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedField {
    grid: GridDims,
    data: DMatrix<f64>,
    subdivision: Vec<usize>,
}

impl NormalizedField {
    pub fn grid(&self) -> GridDims {
        self.grid
    }

    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn n(&self) -> usize {
        self.data.ncols()
    }

    pub fn points(&self) -> usize {
        self.data.nrows()
    }

    pub fn subdivision(&self) -> &[usize] {
        &self.subdivision
    }

    /// Column ranges of the groups
    pub fn groups(&self) -> Vec<Range<usize>> {
        group_ranges(&self.subdivision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_sample() -> FunctionalSample {
        let curves = vec![
            vec![1.0, 2.0, 3.0],
            vec![3.0, 2.0, 1.0],
            vec![2.0, 5.0, 2.0],
        ];
        FunctionalSample::from_curves(&curves).unwrap()
    }

    #[test]
    fn test_grid_dims() {
        assert_eq!(GridDims::OneD(7).points(), 7);
        assert_eq!(GridDims::TwoD(3, 4).points(), 12);
        assert_eq!(GridDims::TwoD(3, 4).dimension(), 2);
        assert_eq!(GridDims::TwoD(3, 4).index_2d(2, 1), 9);
        assert_eq!(GridDims::TwoD(3, 4).to_string(), "3x4");
    }

    #[test]
    fn test_sample_moments() {
        let sample = ramp_sample();
        assert_eq!(sample.n(), 3);
        assert_eq!(sample.points(), 3);

        let mean = sample.pointwise_mean();
        assert_relative_eq!(mean[0], 2.0);
        assert_relative_eq!(mean[1], 3.0);
        assert_relative_eq!(mean[2], 2.0);

        let var = sample.pointwise_variance(&mean);
        assert_relative_eq!(var[0], 1.0);
        assert_relative_eq!(var[1], 3.0);
        assert_relative_eq!(var[2], 1.0);
    }

    #[test]
    fn test_sample_rejects_bad_shapes() {
        let single = vec![vec![1.0, 2.0]];
        assert!(matches!(
            FunctionalSample::from_curves(&single),
            Err(Error::InputShape(_))
        ));

        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            FunctionalSample::from_curves(&ragged),
            Err(Error::InputShape(_))
        ));

        let data = DMatrix::from_element(5, 3, 1.0);
        assert!(FunctionalSample::from_matrix(GridDims::TwoD(2, 2), data).is_err());

        let mut data = DMatrix::from_element(4, 3, 1.0);
        data[(1, 1)] = f64::NAN;
        assert!(FunctionalSample::from_matrix(GridDims::TwoD(2, 2), data).is_err());
    }

    #[test]
    fn test_subdivision_validation() {
        let data = DMatrix::from_element(2, 5, 1.0);
        assert!(ResidualField::with_subdivision(GridDims::OneD(2), data.clone(), vec![2, 5]).is_ok());
        assert!(ResidualField::with_subdivision(GridDims::OneD(2), data.clone(), vec![2, 4]).is_err());
        assert!(ResidualField::with_subdivision(GridDims::OneD(2), data, vec![1, 5]).is_err());
    }

    #[test]
    fn test_normalize_gives_unit_variance() {
        let data = DMatrix::from_row_slice(2, 4, &[1.0, -1.0, 2.0, -2.0, 0.5, 0.5, -0.5, -0.5]);
        let field = ResidualField::new(GridDims::OneD(2), data).unwrap();
        let normalized = field.normalize().unwrap();
        for p in 0..2 {
            let ss: f64 = normalized.data().row(p).iter().map(|x| x * x).sum();
            assert_relative_eq!(ss / 3.0, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_weights_groups() {
        // Group 1 has 2 realizations, group 2 has 3; both carry the same values
        // so after weighting by 1/sqrt(N_g - 1) group 1 dominates.
        let data = DMatrix::from_row_slice(1, 5, &[1.0, -1.0, 1.0, -1.0, 0.0]);
        let field = ResidualField::with_subdivision(GridDims::OneD(1), data, vec![2, 5]).unwrap();
        let groups = field.groups();
        assert_eq!(groups, vec![0..2, 2..5]);

        let normalized = field.normalize().unwrap();
        let row = normalized.data().row(0);
        let ratio = row[0] / row[2];
        assert_relative_eq!(ratio, 2.0f64.sqrt(), epsilon = 1e-12);
        let ss: f64 = row.iter().map(|x| x * x).sum();
        assert_relative_eq!(ss, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_rejects_zero_variance() {
        let data = DMatrix::from_row_slice(2, 3, &[1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
        let field = ResidualField::new(GridDims::OneD(2), data).unwrap();
        assert!(matches!(field.normalize(), Err(Error::Numerical { .. })));
    }
}
