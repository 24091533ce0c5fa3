//! Error types for rolling estimation.

use ikaros_math::MathError;
use ikaros_primitives::{Date, PrimitivesError};

/// Errors that can occur during rolling estimation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The inputs share no dates.
    #[error("inputs have no dates in common")]
    EmptyIntersection,

    /// The regression design of a window is not invertible.
    #[error("singular regression design for window ending {date}")]
    SingularDesign {
        /// Window-end date.
        date: Date,
    },

    /// The covariance matrix of a window is not invertible.
    #[error("singular covariance matrix for {date}")]
    SingularCovariance {
        /// Window-end date.
        date: Date,
    },

    /// Fewer observations than one full window.
    #[error("insufficient observations: window needs {required}, got {actual}")]
    InsufficientWindow {
        /// Observations required.
        required: usize,
        /// Observations available.
        actual: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Malformed input container.
    #[error("invalid input: {0}")]
    Primitives(#[from] PrimitivesError),
}

impl ModelError {
    /// Whether the error is confined to one date and the rest of a rolling run
    /// is still valid.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SingularDesign { .. }
                | Self::SingularCovariance { .. }
                | Self::InsufficientWindow { .. }
        )
    }
}
