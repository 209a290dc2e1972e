//! # Error Types
//!
//! Structured error types for panel_core. A bad input, a failed solve and a
//! non-finite result are separate variants, so callers (and optimizers driving
//! many evaluations) can tell a rejected design apart from a numerical
//! breakdown.
//!
//! ## Example
//!
//! ```rust
//! use panel_core::errors::{PanelError, PanelResult};
//!
//! fn validate_pitch(pitch: f64) -> PanelResult<()> {
//!     if pitch <= 0.0 {
//!         return Err(PanelError::invalid_input(
//!             "stiffener_pitch",
//!             pitch.to_string(),
//!             "Stiffener pitch must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for panel_core operations
pub type PanelResult<T> = Result<T, PanelError>;

/// Structured error type for panel evaluations.
///
/// Numeric payloads are carried as strings so that NaN and infinities survive
/// a JSON round trip.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PanelError {
    /// An input value is invalid (out of range, inconsistent, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A parameter that feeds a log/sqrt/power transform is not strictly positive
    #[error("Non-positive parameter '{parameter}': {value}")]
    NonPositiveParameter { parameter: String, value: String },

    /// A computed quantity is NaN or infinite
    #[error("Non-finite result for '{quantity}': {value}")]
    NonFinite { quantity: String, value: String },

    /// An iterative solve stopped before meeting its tolerance
    #[error("{solver} did not converge after {iterations} iterations (residual {residual})")]
    ConvergenceFailure {
        solver: String,
        iterations: usize,
        residual: String,
    },

    /// Array or table lengths disagree
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl PanelError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        PanelError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a NonPositiveParameter error
    pub fn non_positive(parameter: impl Into<String>, value: f64) -> Self {
        PanelError::NonPositiveParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create a NonFinite error
    pub fn non_finite(quantity: impl Into<String>, value: f64) -> Self {
        PanelError::NonFinite {
            quantity: quantity.into(),
            value: value.to_string(),
        }
    }

    /// Create a ConvergenceFailure error
    pub fn convergence_failure(solver: impl Into<String>, iterations: usize, residual: f64) -> Self {
        PanelError::ConvergenceFailure {
            solver: solver.into(),
            iterations,
            residual: residual.to_string(),
        }
    }

    /// Create a DimensionMismatch error
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        PanelError::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        PanelError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Numerical breakdowns (as opposed to rejected inputs)
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            PanelError::NonFinite { .. } | PanelError::ConvergenceFailure { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PanelError::InvalidInput { .. } => "INVALID_INPUT",
            PanelError::NonPositiveParameter { .. } => "NON_POSITIVE_PARAMETER",
            PanelError::NonFinite { .. } => "NON_FINITE",
            PanelError::ConvergenceFailure { .. } => "CONVERGENCE_FAILURE",
            PanelError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            PanelError::FileError { .. } => "FILE_ERROR",
            PanelError::SerializationError { .. } => "SERIALIZATION_ERROR",
            PanelError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

/// Reject zero, negative and NaN values before a log/sqrt transform.
pub fn ensure_positive(parameter: &str, value: f64) -> PanelResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PanelError::non_positive(parameter, value))
    }
}

/// Reject negative and NaN values where zero is a valid limit.
pub fn ensure_non_negative(field: &str, value: f64) -> PanelResult<f64> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(PanelError::invalid_input(
            field,
            value.to_string(),
            "Must be zero or positive",
        ))
    }
}

/// Reject NaN and infinities.
pub fn ensure_finite(quantity: &str, value: f64) -> PanelResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        log::warn!("non-finite value for {quantity}: {value}");
        Err(PanelError::non_finite(quantity, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = PanelError::invalid_input("panel_width", "-1.0", "Width must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: PanelError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_non_finite_survives_json() {
        let error = PanelError::non_finite("N1crit", f64::NAN);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NaN"));
        let roundtrip: PanelError = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.error_code(), "NON_FINITE");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PanelError::non_positive("xi", 0.0).error_code(), "NON_POSITIVE_PARAMETER");
        assert_eq!(
            PanelError::convergence_failure("shear mode shape", 50, 1e-3).error_code(),
            "CONVERGENCE_FAILURE"
        );
        assert!(PanelError::non_finite("x", f64::INFINITY).is_numerical());
        assert!(!PanelError::non_positive("x", -1.0).is_numerical());
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("rho0", 2.0).unwrap(), 2.0);
        assert!(ensure_positive("rho0", 0.0).is_err());
        assert!(ensure_positive("rho0", -1.0).is_err());
        assert!(ensure_positive("rho0", f64::NAN).is_err());
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("N12crit", 3.0).is_ok());
        assert!(matches!(
            ensure_finite("N12crit", f64::NAN),
            Err(PanelError::NonFinite { .. })
        ));
    }
}
