//! Error types for trip analysis.
//!
//! Most analysis routines cannot fail: sequence boundaries have defined
//! defaults and a missing trip yields a neutral result. The variants here
//! cover what is left: bad parameters, store failures and the internal
//! geometry failures that simplification recovers from.

use thiserror::Error;

/// Trip analysis error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A parameter is outside its accepted range. Retrying with the same
    /// input will fail again.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// The trip id is not known to the store.
    #[error("trip not found: {0}")]
    NotFound(String),

    /// Unexpected geometry failure.
    #[error("computation failed: {0}")]
    Computation(String),

    /// The point or trip store failed.
    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::Validation("percentage must be in (0, 100]".to_string());
        assert_eq!(err.to_string(), "invalid parameter: percentage must be in (0, 100]");

        let err = AnalysisError::NotFound("trip-7".to_string());
        assert_eq!(err.to_string(), "trip not found: trip-7");
    }
}
