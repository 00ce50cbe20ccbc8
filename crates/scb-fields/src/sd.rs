//! Pointwise standard deviation functions

/// Standard deviation of a generated field as a function of location
///
/// Evaluated lazily, once per grid point, when a sample is drawn.
/// Coordinates are in the unit interval (1-D) or unit square (2-D).
pub trait SdFunction: Send + Sync {
    fn sd(&self, x: &[f64]) -> f64;
}

impl<F> SdFunction for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn sd(&self, x: &[f64]) -> f64 {
        self(x)
    }
}

/// The same standard deviation everywhere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSd(pub f64);

impl Default for ConstantSd {
    fn default() -> Self {
        Self(1.0)
    }
}

impl SdFunction for ConstantSd {
    fn sd(&self, _x: &[f64]) -> f64 {
        self.0
    }
}

/// Standard deviation growing linearly from `start` to `end` along the first axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSd {
    pub start: f64,
    pub end: f64,
}

impl SdFunction for LinearSd {
    fn sd(&self, x: &[f64]) -> f64 {
        self.start + (self.end - self.start) * x[0]
    }
}
