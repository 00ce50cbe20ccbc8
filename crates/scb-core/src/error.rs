//! Error types for simultaneous confidence band computation
//!
//! Provides a unified error type for all functional-scb crates.

use thiserror::Error;

/// Core error type for band and quantile operations
#[derive(Error, Debug)]
pub enum Error {
    /// Sample or design arrays have the wrong shape
    #[error("Input shape error: {0}")]
    InputShape(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Quantile method tag is not recognized
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Numerical failure inside a strategy
    #[error("Numerical error during {stage}: {message}")]
    Numerical { stage: String, message: String },

    /// A long-running computation was cancelled or timed out
    #[error("Computation cancelled: {0}")]
    Cancelled(String),

    /// Options could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create a shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::InputShape(message.into())
    }

    /// Create a numerical error tagged with the stage that produced it
    pub fn numerical(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Numerical {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create an error for too few realizations
    pub fn too_few_realizations(expected: usize, actual: usize) -> Self {
        Self::InputShape(format!(
            "expected at least {expected} realizations, got {actual}"
        ))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InputShape(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InputShape(format!("{context} contains NaN or infinite values"))
    }

    /// Wrap an error with the quantile method and stage it occurred in
    ///
    /// Numerical errors get the context prepended to their stage; other
    /// variants pass through untouched.
    pub fn in_stage(self, method: &str, stage: &str) -> Self {
        match self {
            Self::Numerical { stage: inner, message } => Self::Numerical {
                stage: format!("{method}/{stage}/{inner}"),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InputShape("grid mismatch".to_string());
        assert_eq!(err.to_string(), "Input shape error: grid mismatch");

        let err = Error::InvalidParameter("level must be in (0, 1)".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: level must be in (0, 1)");

        let err = Error::UnsupportedMethod("bogus".to_string());
        assert_eq!(err.to_string(), "Unsupported method: bogus");

        let err = Error::numerical("gkf", "failed to bracket root");
        assert_eq!(
            err.to_string(),
            "Numerical error during gkf: failed to bracket root"
        );

        let err = Error::Cancelled("deadline exceeded".to_string());
        assert_eq!(err.to_string(), "Computation cancelled: deadline exceeded");
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::too_few_realizations(2, 1);
        assert!(matches!(err, Error::InputShape(_)));
        assert!(err.to_string().contains("at least 2"));

        let err = Error::size_mismatch(100, 50, "contrast vector");
        assert_eq!(
            err.to_string(),
            "Input shape error: Size mismatch in contrast vector: expected 100, got 50"
        );

        let err = Error::non_finite("sample");
        assert!(err.to_string().contains("NaN or infinite"));
    }

    #[test]
    fn test_in_stage_prefixes_numerical_only() {
        let err = Error::numerical("root-find", "no sign change").in_stage("GKF", "quantile");
        match err {
            Error::Numerical { stage, message } => {
                assert_eq!(stage, "GKF/quantile/root-find");
                assert_eq!(message, "no sign change");
            }
            other => panic!("Wrong error type: {other:?}"),
        }

        let err = Error::shape("bad").in_stage("GKF", "quantile");
        assert!(matches!(err, Error::InputShape(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: Error = anyhow::anyhow!("custom error message").into();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("custom error message"));
    }
}
