//! Portfolio weight and view type definitions.

use ndarray::{Array1, Array2};

use crate::{CovarianceMatrix, PrimitivesError};

/// Portfolio weights for one date, in the canonical instrument ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioWeights {
    weights: Array1<f64>,
}

impl PortfolioWeights {
    /// Wrap a weight vector.
    #[must_use]
    pub const fn new(weights: Array1<f64>) -> Self {
        Self { weights }
    }

    /// Weight vector.
    #[must_use]
    pub const fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Consume and return the weight vector.
    #[must_use]
    pub fn into_inner(self) -> Array1<f64> {
        self.weights
    }

    /// Number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Net exposure (sum of weights).
    #[must_use]
    pub fn net(&self) -> f64 {
        self.weights.sum()
    }

    /// Gross exposure (sum of absolute weights).
    #[must_use]
    pub fn gross(&self) -> f64 {
        self.weights.iter().map(|w| w.abs()).sum()
    }

    /// Portfolio variance under a covariance matrix.
    #[must_use]
    pub fn variance(&self, covariance: &CovarianceMatrix) -> f64 {
        covariance.quadratic_form(&self.weights)
    }

    /// Portfolio return for one period of instrument returns.
    #[must_use]
    pub fn apply(&self, returns: &Array1<f64>) -> f64 {
        self.weights.dot(returns)
    }
}

/// Views expressed on the instrument universe for one date.
#[derive(Debug, Clone)]
pub struct ViewSpecification {
    /// Link (pick) matrix, views x instruments.
    pub link: Array2<f64>,
    /// View covariance (views x views).
    pub view_covariance: Array2<f64>,
    /// Expected return of each view.
    pub view_returns: Array1<f64>,
}

impl ViewSpecification {
    /// Create a view specification, checking dimensions.
    ///
    /// # Errors
    /// Returns `PrimitivesError::ShapeMismatch` if the pieces disagree on the
    /// number of views.
    pub fn new(
        link: Array2<f64>,
        view_covariance: Array2<f64>,
        view_returns: Array1<f64>,
    ) -> Result<Self, PrimitivesError> {
        let n_views = link.nrows();
        if view_covariance.dim() != (n_views, n_views) || view_returns.len() != n_views {
            return Err(PrimitivesError::ShapeMismatch {
                expected_rows: n_views,
                expected_cols: n_views,
                rows: view_covariance.nrows(),
                cols: view_covariance.ncols(),
            });
        }
        Ok(Self { link, view_covariance, view_returns })
    }

    /// Number of views.
    #[must_use]
    pub fn n_views(&self) -> usize {
        self.link.nrows()
    }

    /// Number of instruments.
    #[must_use]
    pub fn n_instruments(&self) -> usize {
        self.link.ncols()
    }
}
