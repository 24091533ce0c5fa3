//! Error types for primitive construction.

use crate::{Date, InstrumentId};

/// Errors raised when a primitive container would violate its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrimitivesError {
    /// Dates and values have different lengths.
    #[error("length mismatch: {dates} dates but {values} values")]
    LengthMismatch {
        /// Number of dates.
        dates: usize,
        /// Number of values.
        values: usize,
    },

    /// Dates are not strictly increasing.
    #[error("dates must be strictly increasing (violated at {0})")]
    UnsortedDates(Date),

    /// A date key was inserted twice.
    #[error("duplicate date: {0}")]
    DuplicateDate(Date),

    /// An instrument appears more than once in a column set.
    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(InstrumentId),

    /// Matrix shape does not match the index lengths.
    #[error("shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        /// Expected number of rows.
        expected_rows: usize,
        /// Expected number of columns.
        expected_cols: usize,
        /// Actual number of rows.
        rows: usize,
        /// Actual number of columns.
        cols: usize,
    },

    /// Matrix is not square.
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Matrix is not symmetric.
    #[error("matrix is not symmetric: |a[{row},{col}] - a[{col},{row}]| exceeds tolerance")]
    NotSymmetric {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },

    /// Series that must share a date index do not.
    #[error("series are not aligned on a common date index")]
    Misaligned,
}
