//! Closed-form long/short mean-variance optimizer at fixed risk.

use ikaros_math::invert_symmetric;
use ikaros_model::{
    CovarianceConfig, ModelError, PrecisionSeries, ShrinkageCovariance, invert_series,
    trailing_mean_returns,
};
use ikaros_primitives::{
    CovarianceSeries, Date, DatedSeries, PortfolioWeights, ReturnMatrix, RollingEstimate,
};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{PortfolioError, WeightSeries};

/// Relative size below which de-meaned returns count as zero.
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// Dollar-neutral weights with the highest expected return at variance `s`.
///
/// Maximizes `w'r` subject to `sum(w) = 0` and `w' Σ w = s`:
///
/// ```text
/// λ2 = (1' Σ⁻¹ r) / (1' Σ⁻¹ 1)
/// r' = r - λ2
/// λ1 = sqrt(r'' Σ⁻¹ r' / 4s)
/// w  = Σ⁻¹ r' / (2 λ1)
/// ```
///
/// Pass `precision` (the inverse of `covariance`) when it is already known.
///
/// # Errors
/// Returns `PortfolioError::InvalidTargetVariance` unless `s > 0`,
/// `PortfolioError::DegenerateReturns` when all expected returns are equal,
/// and `PortfolioError::Math` if the covariance cannot be inverted.
pub fn optimize(
    expected_returns: &Array1<f64>,
    covariance: &Array2<f64>,
    target_variance: f64,
    precision: Option<&Array2<f64>>,
) -> Result<Array1<f64>, PortfolioError> {
    if !(target_variance.is_finite() && target_variance > 0.0) {
        return Err(PortfolioError::InvalidTargetVariance(target_variance));
    }
    let n = expected_returns.len();
    if covariance.dim() != (n, n) {
        return Err(PortfolioError::InstrumentMismatch(format!(
            "{n} expected returns for a {}x{} covariance",
            covariance.nrows(),
            covariance.ncols()
        )));
    }

    let owned;
    let precision = match precision {
        Some(p) => p,
        None => {
            owned = invert_symmetric(covariance)?;
            &owned
        }
    };

    let ones = Array1::<f64>::ones(n);
    let p_ones = precision.dot(&ones);
    let lambda_2 = p_ones.dot(expected_returns) / ones.dot(&p_ones);

    let excess = expected_returns - lambda_2;
    let p_excess = precision.dot(&excess);
    let quad = excess.dot(&p_excess);
    let scale = expected_returns.dot(&precision.dot(expected_returns)).abs();
    if !(quad > DEGENERACY_TOLERANCE * scale) {
        return Err(PortfolioError::DegenerateReturns);
    }

    let lambda_1 = (quad / (4.0 * target_variance)).sqrt();
    Ok(p_excess / (2.0 * lambda_1))
}

/// Configuration for the mean-variance pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanVarianceConfig {
    /// Covariance estimation; its window also sets the expected-return window.
    pub covariance: CovarianceConfig,
    /// Annualized portfolio variance to target.
    pub target_variance: f64,
}

impl Default for MeanVarianceConfig {
    fn default() -> Self {
        Self { covariance: CovarianceConfig::default(), target_variance: 0.35 }
    }
}

impl MeanVarianceConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` or
    /// `PortfolioError::InvalidTargetVariance` for invalid settings.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        self.covariance.validate().map_err(|e| PortfolioError::InvalidConfig(e.to_string()))?;
        if !(self.target_variance.is_finite() && self.target_variance > 0.0) {
            return Err(PortfolioError::InvalidTargetVariance(self.target_variance));
        }
        Ok(())
    }
}

/// Rolling mean-variance portfolio.
///
/// Per window-end date: shrinkage covariance, its inverse, and the trailing
/// mean of returns over the same window feed [`optimize`].
#[derive(Debug, Clone, Default)]
pub struct MeanVariancePortfolio {
    config: MeanVarianceConfig,
}

impl MeanVariancePortfolio {
    /// Create a portfolio builder with a validated configuration.
    ///
    /// # Errors
    /// Returns an error for an invalid configuration.
    pub fn new(config: MeanVarianceConfig) -> Result<Self, PortfolioError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &MeanVarianceConfig {
        &self.config
    }

    /// Compute weights for every window-end date.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` if the covariance settings are
    /// rejected. Per-date failures are recorded in the returned series.
    pub fn run(&self, returns: &ReturnMatrix) -> Result<WeightSeries, PortfolioError> {
        let cov_config = self.config.covariance;
        let covariance = ShrinkageCovariance::new(cov_config)?.estimate(returns);
        let precision = invert_series(&covariance);
        let expected =
            trailing_mean_returns(returns, cov_config.window, cov_config.annualization);

        let dates: Vec<Date> = covariance.matrices().dates().copied().collect();
        let outcomes: Vec<(Date, Result<PortfolioWeights, PortfolioError>)> = dates
            .into_par_iter()
            .map(|date| (date, self.weights_at(date, &covariance, &precision, &expected)))
            .collect();

        let estimates = RollingEstimate::from_outcomes(outcomes);
        for (date, error) in estimates.failures() {
            warn!(%date, %error, "mean-variance weights failed");
        }
        info!(
            dates = estimates.len(),
            failed = estimates.failures().len(),
            target_variance = self.config.target_variance,
            "mean-variance weights complete"
        );
        Ok(WeightSeries::new(returns.instruments().to_vec(), estimates))
    }

    fn weights_at(
        &self,
        date: Date,
        covariance: &CovarianceSeries,
        precision: &PrecisionSeries,
        expected: &DatedSeries<Array1<f64>>,
    ) -> Result<PortfolioWeights, PortfolioError> {
        let Some(inverse) = precision.values().get(&date) else {
            return Err(precision_failure(precision, date));
        };
        let sigma =
            covariance.matrices().get(&date).ok_or(PortfolioError::SingularCovariance { date })?;
        let r = expected.get(&date).ok_or(PortfolioError::DegenerateReturns)?;
        let w = optimize(r, sigma.matrix(), self.config.target_variance, Some(inverse))?;
        Ok(PortfolioWeights::new(w))
    }
}

/// Error for a date whose covariance has no inverse.
pub(crate) fn precision_failure(precision: &PrecisionSeries, date: Date) -> PortfolioError {
    match precision.failures().get(&date) {
        Some(ModelError::SingularCovariance { date }) => {
            PortfolioError::SingularCovariance { date: *date }
        }
        Some(other) => PortfolioError::Model(other.clone()),
        None => PortfolioError::SingularCovariance { date },
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ikaros_model::rolling_covariance;
    use ikaros_primitives::instrument_ids;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};
    use rstest::rstest;

    use super::*;

    fn covariance() -> Array2<f64> {
        array![
            [0.040, 0.006, 0.004, -0.002],
            [0.006, 0.090, 0.010, 0.003],
            [0.004, 0.010, 0.0225, 0.001],
            [-0.002, 0.003, 0.001, 0.0625],
        ]
    }

    #[rstest]
    #[case(array![0.08, 0.12, 0.05, 0.10], 0.35)]
    #[case(array![-0.02, 0.30, 0.01, 0.00], 0.01)]
    #[case(array![1.0, 2.0, 3.0, 4.0], 2.5)]
    fn dollar_neutral_at_target_risk(#[case] r: Array1<f64>, #[case] s: f64) {
        let sigma = covariance();
        let w = optimize(&r, &sigma, s, None).unwrap();

        assert!(w.sum().abs() < 1e-12);
        assert_relative_eq!(w.dot(&sigma.dot(&w)), s, max_relative = 1e-6);
        // Positively aligned with the de-meaned returns.
        assert!(w.dot(&r) > 0.0);
    }

    #[test]
    fn precomputed_precision_gives_same_weights() {
        let sigma = covariance();
        let r = array![0.08, 0.12, 0.05, 0.10];
        let inverse = invert_symmetric(&sigma).unwrap();
        let a = optimize(&r, &sigma, 0.35, None).unwrap();
        let b = optimize(&r, &sigma, 0.35, Some(&inverse)).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-14);
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.1)]
    #[case(f64::NAN)]
    fn rejects_non_positive_target(#[case] s: f64) {
        let r = array![0.1, 0.2, 0.3, 0.4];
        assert!(matches!(
            optimize(&r, &covariance(), s, None),
            Err(PortfolioError::InvalidTargetVariance(_))
        ));
    }

    #[test]
    fn constant_returns_are_degenerate() {
        let r = array![0.05, 0.05, 0.05, 0.05];
        assert!(matches!(
            optimize(&r, &covariance(), 0.35, None),
            Err(PortfolioError::DegenerateReturns)
        ));
    }

    #[test]
    fn singular_covariance_is_reported() {
        let sigma = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(matches!(
            optimize(&array![0.1, 0.2], &sigma, 0.35, None),
            Err(PortfolioError::Math(_))
        ));
    }

    #[test]
    fn pipeline_meets_constraints_every_date() {
        let mut rng = StdRng::seed_from_u64(11);
        let noise = Normal::new(0.0005, 0.015).unwrap();
        let len = 160;
        let dates: Vec<Date> =
            Date::from_ymd_opt(2022, 1, 3).unwrap().iter_days().take(len).collect();
        let values = Array2::from_shape_fn((len, 4), |_| noise.sample(&mut rng));
        let returns =
            ReturnMatrix::new(dates.clone(), instrument_ids(["A", "B", "C", "D"]), values).unwrap();

        let portfolio = MeanVariancePortfolio::default();
        let weights = portfolio.run(&returns).unwrap();

        assert_eq!(weights.estimates().len(), len - 126);
        assert!(weights.estimates().is_complete());
        assert!(weights.get(&dates[126]).is_some());
        assert!(weights.get(&dates[125]).is_none());
        assert_eq!(weights.lagged_returns(&returns).len(), len - 127);

        let covariance = rolling_covariance(&returns, 126, 0.8).unwrap();
        for (date, w) in weights.weights() {
            let sigma = covariance.matrices().get(date).unwrap();
            assert_abs_diff_eq!(w.net(), 0.0, epsilon = 1e-12);
            assert_relative_eq!(w.variance(sigma), 0.35, max_relative = 1e-9);
        }
    }

    #[test]
    fn config_deserializes_nested_defaults() {
        let config: MeanVarianceConfig =
            serde_json::from_str(r#"{"covariance": {"shrinkage": 0.5}}"#).unwrap();
        assert_eq!(config.covariance.window, 126);
        assert_eq!(config.covariance.shrinkage, 0.5);
        assert_eq!(config.target_variance, 0.35);
    }
}
