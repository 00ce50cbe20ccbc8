//! Smooth zero-mean, unit-variance random fields

use rand::Rng;
use rand_distr::StandardNormal;
use scb_core::{Error, GridDims, Result};

/// Generator of zero-mean, unit-variance realizations on a fixed grid
pub trait FieldGenerator {
    fn grid(&self) -> GridDims;

    /// One realization, one value per grid point in row-major order
    fn realization<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64>;
}

/// Equally spaced points on `[0, 1]`
pub fn unit_interval(k: usize) -> Vec<f64> {
    match k {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..k).map(|i| i as f64 / (k - 1) as f64).collect(),
    }
}

/// Coordinates of every grid point in the unit interval or unit square
pub fn grid_coordinates(grid: GridDims) -> Vec<Vec<f64>> {
    match grid {
        GridDims::OneD(k) => unit_interval(k).into_iter().map(|t| vec![t]).collect(),
        GridDims::TwoD(k1, k2) => {
            let (s, t) = (unit_interval(k1), unit_interval(k2));
            s.iter()
                .flat_map(|&si| t.iter().map(move |&tj| vec![si, tj]))
                .collect()
        }
    }
}

/// Random trigonometric polynomial on `[0, 1]`
///
/// `X(t) = sum_f (a_f sin(w_f t) + b_f cos(w_f t)) / sqrt(F)` with i.i.d.
/// standard normal coefficients. With a single frequency `w` the field's
/// first Lipschitz-Killing curvature is exactly `w`.
#[derive(Debug, Clone)]
pub struct SinCosField {
    k: usize,
    frequencies: Vec<f64>,
}

impl SinCosField {
    pub fn new(k: usize, frequencies: Vec<f64>) -> Result<Self> {
        if k == 0 {
            return Err(Error::shape("grid must contain at least one point"));
        }
        if frequencies.is_empty() || frequencies.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidParameter(
                "sine/cosine field needs at least one finite frequency".to_string(),
            ));
        }
        Ok(Self { k, frequencies })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }
}

impl FieldGenerator for SinCosField {
    fn grid(&self) -> GridDims {
        GridDims::OneD(self.k)
    }

    fn realization<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let scale = 1.0 / (self.frequencies.len() as f64).sqrt();
        let coefficients: Vec<(f64, f64)> = self
            .frequencies
            .iter()
            .map(|_| (rng.sample(StandardNormal), rng.sample(StandardNormal)))
            .collect();
        unit_interval(self.k)
            .into_iter()
            .map(|t| {
                let sum: f64 = self
                    .frequencies
                    .iter()
                    .zip(&coefficients)
                    .map(|(w, (a, b))| a * (w * t).sin() + b * (w * t).cos())
                    .sum();
                scale * sum
            })
            .collect()
    }
}

/// Sum of Gaussian bumps with random weights, normalized to unit variance
///
/// Bumps of width `bandwidth` sit on a regular grid of `anchors` points per
/// axis over the unit interval or square.
#[derive(Debug, Clone)]
pub struct GaussDensityField {
    grid: GridDims,
    /// Bump value at every (grid point, anchor) pair, rows scaled to unit norm
    basis: Vec<Vec<f64>>,
    anchors: usize,
}

impl GaussDensityField {
    pub fn new(grid: GridDims, anchors: usize, bandwidth: f64) -> Result<Self> {
        if grid.points() == 0 {
            return Err(Error::shape("grid must contain at least one point"));
        }
        if anchors == 0 || !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "need at least one anchor and a positive bandwidth, got {anchors} and {bandwidth}"
            )));
        }
        let centers = match grid {
            GridDims::OneD(_) => grid_coordinates(GridDims::OneD(anchors)),
            GridDims::TwoD(_, _) => grid_coordinates(GridDims::TwoD(anchors, anchors)),
        };

        let basis = grid_coordinates(grid)
            .iter()
            .map(|x| {
                let mut row: Vec<f64> = centers
                    .iter()
                    .map(|c| {
                        let d2: f64 = x.iter().zip(c).map(|(a, b)| (a - b).powi(2)).sum();
                        (-0.5 * d2 / (bandwidth * bandwidth)).exp()
                    })
                    .collect();
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                row.iter_mut().for_each(|v| *v /= norm);
                row
            })
            .collect::<Vec<_>>();

        if basis.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::numerical(
                "field generation",
                format!("bandwidth {bandwidth} is too small for {anchors} anchors"),
            ));
        }

        Ok(Self {
            grid,
            basis,
            anchors: centers.len(),
        })
    }
}

impl FieldGenerator for GaussDensityField {
    fn grid(&self) -> GridDims {
        self.grid
    }

    fn realization<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let weights: Vec<f64> = (0..self.anchors).map(|_| rng.sample(StandardNormal)).collect();
        self.basis
            .iter()
            .map(|row| row.iter().zip(&weights).map(|(b, w)| b * w).sum())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_grid_coordinates() {
        assert_eq!(unit_interval(3), vec![0.0, 0.5, 1.0]);
        let coords = grid_coordinates(GridDims::TwoD(2, 3));
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[1], vec![0.0, 0.5]);
        assert_eq!(coords[3], vec![1.0, 0.0]);
    }

    #[test]
    fn test_sincos_unit_variance() {
        let field = SinCosField::new(11, vec![1.0, 4.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let n = 20000;
        let mut sum_sq = vec![0.0; 11];
        for _ in 0..n {
            for (acc, x) in sum_sq.iter_mut().zip(field.realization(&mut rng)) {
                *acc += x * x;
            }
        }
        for acc in sum_sq {
            assert_relative_eq!(acc / n as f64, 1.0, epsilon = 0.05);
        }
    }

    #[test]
    fn test_gauss_density_field_unit_variance() {
        let field = GaussDensityField::new(GridDims::TwoD(6, 5), 4, 0.2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let n = 20000;
        let mut sum_sq = vec![0.0; 30];
        for _ in 0..n {
            for (acc, x) in sum_sq.iter_mut().zip(field.realization(&mut rng)) {
                *acc += x * x;
            }
        }
        for acc in sum_sq {
            assert_relative_eq!(acc / n as f64, 1.0, epsilon = 0.05);
        }
    }

    #[test]
    fn test_invalid_generators() {
        assert!(SinCosField::new(0, vec![1.0]).is_err());
        assert!(SinCosField::new(10, vec![]).is_err());
        assert!(GaussDensityField::new(GridDims::OneD(10), 0, 0.1).is_err());
        assert!(GaussDensityField::new(GridDims::OneD(10), 5, -0.1).is_err());
        assert!(GaussDensityField::new(GridDims::OneD(10), 5, 1e-4).is_err());
    }
}
