//! Error types for manifold operations and solver runs.
//!
//! Two layers: [`ManifoldError`] covers geometric and numerical failures
//! inside an iteration, [`SolverError`] covers run-level failures that abort
//! a solver before or during its loop. Recoverable conditions (a stalled
//! line search, a non-converged run) are *not* errors; they are reported via
//! the result record.

use thiserror::Error;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, Error)]
pub enum ManifoldError {
    /// Point fails the manifold's membership constraint.
    #[error("point is not on the manifold: {reason}")]
    InvalidPoint {
        /// Description of the violated constraint.
        reason: String,
    },

    /// Vector is not in the tangent space at the given point.
    #[error("vector is not in the tangent space: {reason}")]
    InvalidTangent {
        /// Description of the violated constraint.
        reason: String,
    },

    /// Operands have incompatible shapes.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// Numerical instability (near-singular solve, invalid decomposition).
    #[error("numerical error: {reason}")]
    NumericalError {
        /// Description of the numerical issue.
        reason: String,
    },

    /// Optional operation not implemented for this manifold or cost function.
    #[error("not implemented: {feature}")]
    NotImplemented {
        /// Name of the missing operation.
        feature: String,
    },
}

impl ManifoldError {
    /// Creates an `InvalidPoint` error.
    pub fn invalid_point<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidTangent` error.
    pub fn invalid_tangent<S: Into<String>>(reason: S) -> Self {
        Self::InvalidTangent {
            reason: reason.into(),
        }
    }

    /// Creates a `DimensionMismatch` error.
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

    /// Creates a `NumericalError`.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Creates a `NotImplemented` error.
    pub fn not_implemented<S: Into<String>>(feature: S) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }
}

/// Errors that abort a solver run.
///
/// These are the fatal conditions of the error design: they surface
/// synchronously before (or instead of) iterating. A run that merely fails
/// to converge terminates normally with a descriptive
/// [`TerminationReason`](crate::solver::TerminationReason).
#[derive(Debug, Clone, Error)]
pub enum SolverError {
    /// A required gradient or Hessian oracle was not supplied.
    #[error("oracle unavailable: {oracle} is required but was not supplied")]
    OracleUnavailable {
        /// Name of the missing oracle.
        oracle: String,
    },

    /// The initial point fails the manifold's feasibility check.
    #[error("invalid initial point: {reason}")]
    InvalidInitialPoint {
        /// Description of the violated constraint.
        reason: String,
    },

    /// A solver was configured with invalid parameters.
    #[error("invalid configuration for {parameter}: {reason}")]
    InvalidConfiguration {
        /// Name of the offending parameter.
        parameter: String,
        /// Description of the problem.
        reason: String,
    },

    /// A manifold operation failed mid-iteration.
    #[error("manifold operation failed: {0}")]
    Manifold(#[from] ManifoldError),
}

impl SolverError {
    /// Creates an `OracleUnavailable` error.
    pub fn oracle_unavailable<S: Into<String>>(oracle: S) -> Self {
        Self::OracleUnavailable {
            oracle: oracle.into(),
        }
    }

    /// Creates an `InvalidInitialPoint` error.
    pub fn invalid_initial_point<S: Into<String>>(reason: S) -> Self {
        Self::InvalidInitialPoint {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidConfiguration` error.
    pub fn invalid_configuration<S1, S2>(parameter: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::InvalidConfiguration {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for manifold operations.
pub type Result<T> = std::result::Result<T, ManifoldError>;

/// Result type for solver runs.
pub type SolverResult<T> = std::result::Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifold_error_display() {
        let err = ManifoldError::invalid_point("norm is 0.5, expected 1");
        assert_eq!(
            err.to_string(),
            "point is not on the manifold: norm is 0.5, expected 1"
        );

        let err = ManifoldError::dimension_mismatch("(3, 3)", "(4, 4)");
        assert!(err.to_string().contains("expected (3, 3)"));
    }

    #[test]
    fn test_solver_error_from_manifold_error() {
        let err: SolverError = ManifoldError::numerical_error("singular matrix").into();
        assert!(matches!(err, SolverError::Manifold(_)));
        assert!(err.to_string().contains("singular matrix"));
    }

    #[test]
    fn test_oracle_unavailable_display() {
        let err = SolverError::oracle_unavailable("Hessian-vector product");
        assert_eq!(
            err.to_string(),
            "oracle unavailable: Hessian-vector product is required but was not supplied"
        );
    }
}
