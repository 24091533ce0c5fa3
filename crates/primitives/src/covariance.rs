//! Covariance matrix definitions.

use ndarray::{Array1, Array2};

use crate::{DatedSeries, InstrumentId, PrimitivesError};

/// Relative tolerance used when checking symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// A symmetric covariance matrix in the canonical instrument ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    matrix: Array2<f64>,
}

impl CovarianceMatrix {
    /// Wrap a square symmetric matrix.
    ///
    /// # Errors
    /// Returns an error if the matrix is not square or not symmetric.
    pub fn new(matrix: Array2<f64>) -> Result<Self, PrimitivesError> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(PrimitivesError::NotSquare { rows, cols });
        }
        let scale = matrix.iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
        for i in 0..rows {
            for j in (i + 1)..cols {
                if (matrix[[i, j]] - matrix[[j, i]]).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(PrimitivesError::NotSymmetric { row: i, col: j });
                }
            }
        }
        Ok(Self { matrix })
    }

    /// A diagonal matrix with the given variances.
    #[must_use]
    pub fn from_diagonal(variances: &Array1<f64>) -> Self {
        Self { matrix: Array2::from_diag(variances) }
    }

    /// The underlying matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Consume and return the underlying matrix.
    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.matrix
    }

    /// Number of instruments.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Diagonal (per-instrument variances).
    #[must_use]
    pub fn variances(&self) -> Array1<f64> {
        self.matrix.diag().to_owned()
    }

    /// Portfolio variance `w' Σ w`.
    #[must_use]
    pub fn quadratic_form(&self, weights: &Array1<f64>) -> f64 {
        weights.dot(&self.matrix.dot(weights))
    }
}

/// A covariance time series: one matrix per window-end date.
#[derive(Debug, Clone)]
pub struct CovarianceSeries {
    instruments: Vec<InstrumentId>,
    matrices: DatedSeries<CovarianceMatrix>,
}

impl CovarianceSeries {
    /// Create a new covariance series.
    #[must_use]
    pub const fn new(
        instruments: Vec<InstrumentId>,
        matrices: DatedSeries<CovarianceMatrix>,
    ) -> Self {
        Self { instruments, matrices }
    }

    /// Instrument ordering shared by every matrix.
    #[must_use]
    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    /// Per-date matrices.
    #[must_use]
    pub const fn matrices(&self) -> &DatedSeries<CovarianceMatrix> {
        &self.matrices
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn rejects_non_square() {
        let err = CovarianceMatrix::new(Array2::zeros((2, 3))).unwrap_err();
        assert_eq!(err, PrimitivesError::NotSquare { rows: 2, cols: 3 });
    }

    #[test]
    fn rejects_asymmetric() {
        let err = CovarianceMatrix::new(array![[1.0, 0.5], [0.4, 1.0]]).unwrap_err();
        assert_eq!(err, PrimitivesError::NotSymmetric { row: 0, col: 1 });
    }

    #[test]
    fn quadratic_form() {
        let cov = CovarianceMatrix::new(array![[0.04, 0.01], [0.01, 0.09]]).unwrap();
        let w = array![1.0, -1.0];
        assert!((cov.quadratic_form(&w) - 0.11).abs() < 1e-12);
        assert_eq!(cov.variances(), array![0.04, 0.09]);
    }
}
