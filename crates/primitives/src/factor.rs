//! Factor model result definitions.

use ndarray::Array1;

use crate::CovarianceMatrix;

/// Single-factor model estimates for one window-end date.
///
/// `covariance` equals `systematic + idiosyncratic` up to rounding.
#[derive(Debug, Clone)]
pub struct FactorModelResult {
    /// Annualized expected return per instrument.
    pub expected_returns: Array1<f64>,
    /// Benchmark beta per instrument.
    pub betas: Array1<f64>,
    /// Residual (idiosyncratic) variance per instrument, per period.
    pub idiosyncratic_variances: Array1<f64>,
    /// Annualized full covariance.
    pub covariance: CovarianceMatrix,
    /// Annualized systematic covariance (benchmark variance times beta outer product).
    pub systematic: CovarianceMatrix,
    /// Annualized idiosyncratic covariance (diagonal).
    pub idiosyncratic: CovarianceMatrix,
}

impl FactorModelResult {
    /// Number of instruments.
    #[must_use]
    pub fn n_instruments(&self) -> usize {
        self.betas.len()
    }

    /// Largest elementwise gap between the full covariance and the sum of its parts.
    #[must_use]
    pub fn decomposition_error(&self) -> f64 {
        let parts = self.systematic.matrix() + self.idiosyncratic.matrix();
        (self.covariance.matrix() - &parts).iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }
}
