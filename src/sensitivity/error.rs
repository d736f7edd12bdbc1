//! Error types for sensitivity analysis.

use std::fmt;

/// Result type for sensitivity operations.
pub type SensitivityResult<T> = Result<T, SensitivityError>;

/// Errors that can occur during sensitivity analysis.
#[derive(Debug, Clone)]
pub enum SensitivityError {
    /// The problem carries an empty parameter vector, so a parameter
    /// gradient is undefined. Raised before any numerical work starts.
    MissingParameters { context: String },

    /// The iterative linear solve did not converge within the iteration cap.
    DidNotConverge {
        iterations: usize,
        tolerance: f64,
        context: String,
    },

    /// Numerical computation failed (e.g., singular Jacobian).
    NumericalError { message: String },

    /// Invalid input shapes, indices, or solution data.
    InvalidInput { context: String },

    /// Error from underlying numr operation.
    NumrError(String),
}

impl fmt::Display for SensitivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParameters { context } => {
                write!(
                    f,
                    "{}: problem has no parameters; parameter gradients are undefined",
                    context
                )
            }
            Self::DidNotConverge {
                iterations,
                tolerance,
                context,
            } => {
                write!(
                    f,
                    "{}: did not converge after {} iterations (tolerance: {})",
                    context, iterations, tolerance
                )
            }
            Self::NumericalError { message } => {
                write!(f, "Numerical error: {}", message)
            }
            Self::InvalidInput { context } => {
                write!(f, "Invalid input in {}", context)
            }
            Self::NumrError(msg) => {
                write!(f, "numr error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SensitivityError {}

impl From<numr::error::Error> for SensitivityError {
    fn from(err: numr::error::Error) -> Self {
        Self::NumrError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SensitivityError::MissingParameters {
            context: "steady_state_adjoint".to_string(),
        };
        assert!(err.to_string().contains("no parameters"));

        let err = SensitivityError::DidNotConverge {
            iterations: 100,
            tolerance: 1e-8,
            context: "gmres".to_string(),
        };
        assert!(err.to_string().contains("100 iterations"));

        let err = SensitivityError::NumericalError {
            message: "singular Jacobian".to_string(),
        };
        assert!(err.to_string().contains("singular Jacobian"));

        let err = SensitivityError::InvalidInput {
            context: "scatter_state_gradient: save index out of bounds".to_string(),
        };
        assert!(err.to_string().contains("save index"));
    }

    #[test]
    fn test_numr_error_conversion() {
        let numr_err = numr::error::Error::InvalidArgument {
            arg: "x",
            reason: "empty tensor".to_string(),
        };
        let err: SensitivityError = numr_err.into();
        assert!(matches!(err, SensitivityError::NumrError(_)));
    }
}
