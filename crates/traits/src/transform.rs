//! Time-series transformation trait definitions.

use ikaros_primitives::TimeSeries;

/// Errors that can occur during transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Empty input data.
    #[error("empty input data")]
    EmptyData,

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical error (NaN, Inf).
    #[error("numerical error: {0}")]
    Numerical(String),
}

/// Time-series transformation of a single scalar series.
///
/// Output dates are a subset of input dates; a transform must not read values
/// dated after the output date.
pub trait SeriesTransform: Send + Sync {
    /// Transform a series.
    ///
    /// # Errors
    /// Returns `TransformError` if the parameters or input are invalid.
    fn transform(&self, series: &TimeSeries) -> Result<TimeSeries, TransformError>;

    /// Returns the name of this transformation.
    fn name(&self) -> &str;
}
