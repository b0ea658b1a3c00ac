//! Error types for search-direction computations.
//!
//! This module defines the error type surfaced by the direction engine and
//! by the objective collaborators it consumes. A rejected curvature pair is
//! not an error: the history simply skips it.

use thiserror::Error;

/// Errors that can occur while computing a search direction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectionError {
    /// The objective declares constraints the engine cannot handle.
    ///
    /// Only box constraints exposed through a constraint handler are
    /// supported. There is no fallback for general constraints.
    #[error("Unsupported constraint: {reason}")]
    UnsupportedConstraint {
        /// Description of the offending constraint setup
        reason: String,
    },

    /// The computed direction leaves the feasible region.
    ///
    /// This is a post-condition failure and indicates a logic or numerical
    /// error; it is never silently corrected.
    #[error("Internal infeasibility: {reason}")]
    InternalInfeasibility {
        /// Description of the violated post-condition
        reason: String,
    },

    /// Dimension mismatch between vectors.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: String,
        /// Actual dimension
        actual: String,
    },

    /// Invalid engine configuration.
    #[error("Invalid configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Box bounds are malformed.
    #[error("Invalid bounds: {reason}")]
    InvalidBounds {
        /// Description of why the bounds are invalid
        reason: String,
    },

    /// A history snapshot cannot be restored.
    #[error("Invalid history snapshot: {reason}")]
    InvalidSnapshot {
        /// Description of the inconsistency
        reason: String,
    },
}

impl DirectionError {
    /// Create an UnsupportedConstraint error.
    pub fn unsupported_constraint<S: Into<String>>(reason: S) -> Self {
        Self::UnsupportedConstraint {
            reason: reason.into(),
        }
    }

    /// Create an InternalInfeasibility error.
    pub fn internal_infeasibility<S: Into<String>>(reason: S) -> Self {
        Self::InternalInfeasibility {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create an InvalidBounds error.
    pub fn invalid_bounds<S: Into<String>>(reason: S) -> Self {
        Self::InvalidBounds {
            reason: reason.into(),
        }
    }

    /// Create an InvalidSnapshot error.
    pub fn invalid_snapshot<S: Into<String>>(reason: S) -> Self {
        Self::InvalidSnapshot {
            reason: reason.into(),
        }
    }
}

/// Result type alias for direction computations.
pub type Result<T> = std::result::Result<T, DirectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DirectionError::unsupported_constraint("handler is not box-shaped");
        assert!(matches!(err, DirectionError::UnsupportedConstraint { .. }));
        assert_eq!(
            err.to_string(),
            "Unsupported constraint: handler is not box-shaped"
        );

        let err = DirectionError::dimension_mismatch(3, 4);
        assert!(matches!(err, DirectionError::DimensionMismatch { .. }));
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 4");
    }

    #[test]
    fn test_configuration_error_context() {
        let err = DirectionError::invalid_configuration("must be positive", "memory_size", "0");

        if let DirectionError::InvalidConfiguration {
            reason,
            parameter,
            value,
        } = &err
        {
            assert_eq!(reason, "must be positive");
            assert_eq!(parameter, "memory_size");
            assert_eq!(value, "0");
        } else {
            panic!("Expected InvalidConfiguration variant");
        }
        assert!(err.to_string().contains("memory_size = 0"));
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            DirectionError::unsupported_constraint("no handler"),
            DirectionError::internal_infeasibility("x + d leaves the box"),
            DirectionError::dimension_mismatch("5", "6"),
            DirectionError::invalid_configuration("negative", "curvature_threshold", "-1"),
            DirectionError::invalid_bounds("lower > upper at index 2"),
            DirectionError::invalid_snapshot("length mismatch"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
