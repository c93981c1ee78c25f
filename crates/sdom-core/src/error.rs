//! Unified error types for the SDOM workspace
//!
//! This module provides a common error type [`SdomError`] that can represent
//! errors from any part of the system. Domain-specific failures are converted
//! to `SdomError` for uniform handling at API boundaries.

use thiserror::Error;

/// Unified error type for all SDOM operations.
///
/// Configuration and data problems are distinguished so callers can tell a
/// malformed case directory apart from inputs that violate model invariants:
/// both fail fast, before any model is built.
#[derive(Error, Debug)]
pub enum SdomError {
    /// I/O errors (file access, directory scans)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Case configuration errors (missing file, unknown formulation, schema mismatch)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input data violating a model invariant
    #[error("Data error: {0}")]
    Data(String),

    /// Solver failures (backend missing, crashed, rejected the model)
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SdomError.
pub type SdomResult<T> = Result<T, SdomError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for SdomError {
    fn from(err: anyhow::Error) -> Self {
        SdomError::Other(err.to_string())
    }
}

impl From<String> for SdomError {
    fn from(s: String) -> Self {
        SdomError::Other(s)
    }
}

impl From<&str> for SdomError {
    fn from(s: &str) -> Self {
        SdomError::Other(s.to_string())
    }
}

impl From<csv::Error> for SdomError {
    fn from(err: csv::Error) -> Self {
        SdomError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SdomError::Config("missing Scalars table".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing Scalars table"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SdomError = io_err.into();
        assert!(matches!(err, SdomError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> SdomResult<()> {
            Err(SdomError::Data("capacity factor above one".into()))
        }

        fn outer() -> SdomResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
