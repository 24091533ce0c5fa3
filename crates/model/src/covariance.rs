//! Rolling shrinkage covariance and its inverse.

use ikaros_math::{MathError, invert_symmetric, sample_covariance, shrink_to_diagonal};
use ikaros_primitives::{CovarianceMatrix, CovarianceSeries, Date, ReturnMatrix, RollingEstimate};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ModelError, rolling::run_windows};

/// Per-date inverse covariance matrices.
pub type PrecisionSeries = RollingEstimate<Array2<f64>, ModelError>;

/// Configuration for the rolling shrinkage covariance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CovarianceConfig {
    /// Observations per window.
    pub window: usize,
    /// Weight on the sample covariance; the rest goes to its diagonal.
    pub shrinkage: f64,
    /// Periods per year.
    pub annualization: f64,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self { window: 126, shrinkage: 0.8, annualization: 252.0 }
    }
}

impl CovarianceConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for a window below 2, a shrinkage
    /// factor outside `[0, 1]`, or a non-positive annualization factor.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.window < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        if !(0.0..=1.0).contains(&self.shrinkage) {
            return Err(ModelError::InvalidConfig(format!(
                "shrinkage must be in [0, 1], got {}",
                self.shrinkage
            )));
        }
        if !(self.annualization.is_finite() && self.annualization > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "annualization must be positive, got {}",
                self.annualization
            )));
        }
        Ok(())
    }
}

/// Rolling sample covariance shrunk toward its diagonal.
#[derive(Debug, Clone, Default)]
pub struct ShrinkageCovariance {
    config: CovarianceConfig,
}

impl ShrinkageCovariance {
    /// Create an estimator with a validated configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for an invalid configuration.
    pub fn new(config: CovarianceConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CovarianceConfig {
        &self.config
    }

    /// Estimate one annualized, shrunk covariance per window-end date.
    ///
    /// Window `[i, i + window)` is keyed by the date that follows it.
    #[must_use]
    pub fn estimate(&self, returns: &ReturnMatrix) -> CovarianceSeries {
        let CovarianceConfig { window, shrinkage, annualization } = self.config;
        let matrices = run_windows("covariance", returns.dates(), window, |i, _| {
            let sample = sample_covariance(returns.window(i, window))? * annualization;
            Ok(CovarianceMatrix::new(shrink_to_diagonal(&sample, shrinkage)?)?)
        })
        .into_values();
        CovarianceSeries::new(returns.instruments().to_vec(), matrices)
    }
}

/// Rolling shrinkage covariance with the default annualization.
///
/// # Errors
/// Returns `ModelError::InvalidConfig` for an invalid window or shrinkage factor.
pub fn rolling_covariance(
    returns: &ReturnMatrix,
    window: usize,
    shrinkage: f64,
) -> Result<CovarianceSeries, ModelError> {
    let config = CovarianceConfig { window, shrinkage, ..CovarianceConfig::default() };
    Ok(ShrinkageCovariance::new(config)?.estimate(returns))
}

/// Invert every matrix of a covariance series.
///
/// A rank-deficient matrix is recorded as `ModelError::SingularCovariance` for
/// its date; the input series is left untouched.
#[must_use]
pub fn invert_series(series: &CovarianceSeries) -> PrecisionSeries {
    let entries: Vec<(&Date, &CovarianceMatrix)> = series.matrices().iter().collect();
    let outcomes: Vec<(Date, Result<Array2<f64>, ModelError>)> = entries
        .into_par_iter()
        .map(|(date, cov)| {
            let inverse = invert_symmetric(cov.matrix()).map_err(|e| match e {
                MathError::SingularMatrix => ModelError::SingularCovariance { date: *date },
                other => ModelError::Math(other),
            });
            (*date, inverse)
        })
        .collect();

    let result = RollingEstimate::from_outcomes(outcomes);
    for (date, error) in result.failures() {
        warn!(%date, %error, "covariance inversion failed");
    }
    info!(dates = result.len(), failed = result.failures().len(), "covariance series inverted");
    result
}
