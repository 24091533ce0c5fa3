//! Error types for mathematical operations.

/// Errors that can occur during mathematical operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    /// The matrix has no inverse at working precision.
    #[error("matrix is singular or nearly singular")]
    SingularMatrix,

    /// Not enough observations for the number of regressors.
    #[error("underdetermined system: {observations} observations for {regressors} regressors")]
    Underdetermined {
        /// Number of observations.
        observations: usize,
        /// Number of regressors, including the intercept.
        regressors: usize,
    },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Too few observations for a statistic.
    #[error("insufficient data: need {required} observations, got {actual}")]
    InsufficientData {
        /// Minimum number of observations.
        required: usize,
        /// Observations supplied.
        actual: usize,
    },

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MathError::Underdetermined { observations: 2, regressors: 3 };
        assert!(err.to_string().contains('2') && err.to_string().contains('3'));

        let err = MathError::DimensionMismatch { expected: 10, actual: 5 };
        assert!(err.to_string().contains("10") && err.to_string().contains('5'));
    }
}
