//! Error types for portfolio construction.

use ikaros_math::MathError;
use ikaros_model::ModelError;
use ikaros_primitives::{Date, PrimitivesError};
use ikaros_traits::SignalError;

/// Errors that can occur during portfolio construction.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// The target variance must be positive and finite.
    #[error("target variance must be positive, got {0}")]
    InvalidTargetVariance(f64),

    /// Expected returns carry no information beyond their mean.
    #[error("expected returns are constant across instruments")]
    DegenerateReturns,

    /// The covariance (or view covariance) of a date is not invertible.
    #[error("singular covariance matrix for {date}")]
    SingularCovariance {
        /// Affected date.
        date: Date,
    },

    /// The number of views and of view returns differ.
    #[error("{views} views but {returns} view returns")]
    ViewCountMismatch {
        /// Number of view panels.
        views: usize,
        /// Number of view returns.
        returns: usize,
    },

    /// Inputs disagree on the instrument universe.
    #[error("instrument mismatch: {0}")]
    InstrumentMismatch(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rolling estimation error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Malformed input container.
    #[error("invalid input: {0}")]
    Primitives(#[from] PrimitivesError),

    /// A signal could not be evaluated.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}

impl PortfolioError {
    /// Whether the error is confined to one date.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::SingularCovariance { .. } | Self::DegenerateReturns => true,
            Self::Model(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PortfolioError::ViewCountMismatch { views: 2, returns: 3 };
        assert_eq!(err.to_string(), "2 views but 3 view returns");
        assert!(PortfolioError::InvalidTargetVariance(-1.0).to_string().contains("-1"));
    }

    #[test]
    fn recoverability() {
        let date = Date::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(PortfolioError::SingularCovariance { date }.is_recoverable());
        assert!(PortfolioError::Model(ModelError::SingularCovariance { date }).is_recoverable());
        assert!(!PortfolioError::Model(ModelError::EmptyIntersection).is_recoverable());
        assert!(!PortfolioError::InvalidConfig("tau".to_string()).is_recoverable());
    }
}
