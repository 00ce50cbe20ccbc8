//! Core types for simultaneous confidence bands over functional data
//!
//! This crate provides the shared foundation of the band pipeline:
//!
//! - [`FunctionalSample`]: `N` realizations of a random field on a 1-D or
//!   2-D grid
//! - [`ResidualField`] and [`NormalizedField`]: the residuals handed to
//!   curvature and bootstrap estimators, with normalization to unit
//!   pointwise variance as an explicit step
//! - [`Error`]: the error taxonomy shared by every crate in the workspace
//! - [`ExecutionStrategy`] and [`CancellationToken`]: scheduling of
//!   independent resampling tasks
//!
//! # Example
//!
//! ```rust
//! use scb_core::{FunctionalSample, GridDims, ResidualField};
//! use nalgebra::DMatrix;
//!
//! let curves = vec![vec![0.0, 1.0, 2.0], vec![1.0, 1.5, 1.0], vec![2.0, 0.5, 0.0]];
//! let sample = FunctionalSample::from_curves(&curves).unwrap();
//! let mean = sample.pointwise_mean();
//!
//! let residuals = DMatrix::from_fn(3, 3, |p, n| sample.data()[(p, n)] - mean[p]);
//! let field = ResidualField::new(GridDims::OneD(3), residuals).unwrap();
//! let normalized = field.normalize().unwrap();
//! assert_eq!(normalized.n(), 3);
//! ```

pub mod error;
pub mod execution;
pub mod field;
pub mod math;

// Re-export core types
pub use error::{Error, Result};
pub use execution::{CancellationToken, ExecutionStrategy};
pub use field::{FunctionalSample, GridDims, NormalizedField, ResidualField};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::{
        CancellationToken, ExecutionStrategy, FunctionalSample, GridDims, NormalizedField,
        ResidualField, Result,
    };
}
