//! Rolling single-factor (market) model.

use ikaros_math::{MathError, mean, regress, sample_variance};
use ikaros_primitives::{
    CovarianceMatrix, CovarianceSeries, Date, DateIndexed, DatedSeries, FactorModelResult,
    InstrumentId, ReturnMatrix, RollingEstimate,
};
use ikaros_traits::BenchmarkSeries;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{ModelError, common_dates, rolling::run_windows};

/// Configuration for the rolling factor model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorModelConfig {
    /// Observations per regression window.
    pub window: usize,
    /// Periods per year, applied to expected returns and covariances.
    pub annualization: f64,
}

impl Default for FactorModelConfig {
    fn default() -> Self {
        Self { window: 126, annualization: 252.0 }
    }
}

impl FactorModelConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the window cannot support a
    /// regression with intercept or the annualization factor is not positive.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.window < 3 {
            return Err(ModelError::InvalidConfig(format!(
                "window must be at least 3, got {}",
                self.window
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

/// Output of a rolling factor model run.
#[derive(Debug, Clone)]
pub struct FactorModelOutput {
    instruments: Vec<InstrumentId>,
    estimates: RollingEstimate<FactorModelResult, ModelError>,
}

impl FactorModelOutput {
    /// Instrument ordering of every vector and matrix.
    #[must_use]
    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    /// Per-date results and failures.
    #[must_use]
    pub const fn estimates(&self) -> &RollingEstimate<FactorModelResult, ModelError> {
        &self.estimates
    }

    /// Annualized expected returns per window-end date.
    #[must_use]
    pub fn expected_returns(&self) -> DatedSeries<Array1<f64>> {
        self.estimates.values().map(|r| r.expected_returns.clone())
    }

    /// Betas per window-end date.
    #[must_use]
    pub fn betas(&self) -> DatedSeries<Array1<f64>> {
        self.estimates.values().map(|r| r.betas.clone())
    }

    /// Full covariance series.
    #[must_use]
    pub fn covariance(&self) -> CovarianceSeries {
        self.project(|r| r.covariance.clone())
    }

    /// Systematic covariance series.
    #[must_use]
    pub fn systematic(&self) -> CovarianceSeries {
        self.project(|r| r.systematic.clone())
    }

    /// Idiosyncratic covariance series.
    #[must_use]
    pub fn idiosyncratic(&self) -> CovarianceSeries {
        self.project(|r| r.idiosyncratic.clone())
    }

    fn project(&self, f: impl Fn(&FactorModelResult) -> CovarianceMatrix) -> CovarianceSeries {
        CovarianceSeries::new(self.instruments.clone(), self.estimates.values().map(f))
    }

    /// Consume and return the per-date estimates.
    #[must_use]
    pub fn into_estimates(self) -> RollingEstimate<FactorModelResult, ModelError> {
        self.estimates
    }
}

/// Single-factor model re-estimated over a sliding window.
///
/// For each window every instrument's return is regressed on the benchmark
/// excess return with an intercept. Expected returns follow CAPM with the
/// window-average risk-free rate and benchmark total return, and the
/// covariance is `var_m * beta beta' + diag(residual variances)`.
#[derive(Debug, Clone, Default)]
pub struct RollingFactorModel {
    config: FactorModelConfig,
}

impl RollingFactorModel {
    /// Create a model with a validated configuration.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` for an invalid configuration.
    pub fn new(config: FactorModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FactorModelConfig {
        &self.config
    }

    /// Estimate the model for every window.
    ///
    /// Inputs are first aligned on their common dates. Windows that fail
    /// numerically are recorded as per-date failures.
    ///
    /// # Errors
    /// Returns `ModelError::EmptyIntersection` if the inputs share no dates.
    pub fn estimate(
        &self,
        returns: &ReturnMatrix,
        benchmark: &BenchmarkSeries,
    ) -> Result<FactorModelOutput, ModelError> {
        let aligned = AlignedInputs::new(returns, benchmark)?;
        let window = self.config.window;
        let estimates = run_windows("factor_model", aligned.returns.dates(), window, |i, date| {
            aligned.estimate_window(i, window, date, self.config.annualization)
        });
        Ok(FactorModelOutput { instruments: returns.instruments().to_vec(), estimates })
    }

    /// Estimate the model for the single window keyed by `date`.
    ///
    /// # Errors
    /// Returns `ModelError::InsufficientWindow` if fewer than `window` aligned
    /// observations precede `date`, and any per-window failure.
    pub fn estimate_at(
        &self,
        returns: &ReturnMatrix,
        benchmark: &BenchmarkSeries,
        date: Date,
    ) -> Result<FactorModelResult, ModelError> {
        let aligned = AlignedInputs::new(returns, benchmark)?;
        let window = self.config.window;
        let dates = aligned.returns.dates();
        let end = dates.partition_point(|d| *d < date);
        if end >= dates.len() || dates[end] != date || end < window {
            return Err(ModelError::InsufficientWindow { required: window, actual: end });
        }
        aligned.estimate_window(end - window, window, date, self.config.annualization)
    }
}

/// Model inputs restricted to their common dates.
struct AlignedInputs {
    returns: ReturnMatrix,
    excess: Array1<f64>,
    total: Array1<f64>,
    risk_free: Array1<f64>,
}

impl AlignedInputs {
    fn new(returns: &ReturnMatrix, benchmark: &BenchmarkSeries) -> Result<Self, ModelError> {
        let dates = common_dates(&[
            returns,
            &benchmark.excess,
            &benchmark.total,
            &benchmark.risk_free,
        ])?;
        Ok(Self {
            returns: returns.restrict_to(&dates),
            excess: benchmark.excess.restrict_to(&dates).values().clone(),
            total: benchmark.total.restrict_to(&dates).values().clone(),
            risk_free: benchmark.risk_free.restrict_to(&dates).values().clone(),
        })
    }

    fn estimate_window(
        &self,
        start: usize,
        window: usize,
        date: Date,
        annualization: f64,
    ) -> Result<FactorModelResult, ModelError> {
        let range = start..start + window;
        estimate_window(
            self.returns.window(start, window),
            self.excess.slice_axis(Axis(0), range.clone().into()),
            self.total.slice_axis(Axis(0), range.clone().into()),
            self.risk_free.slice_axis(Axis(0), range.into()),
            date,
            annualization,
        )
    }
}

fn estimate_window(
    returns: ArrayView2<'_, f64>,
    excess: ArrayView1<'_, f64>,
    total: ArrayView1<'_, f64>,
    risk_free: ArrayView1<'_, f64>,
    date: Date,
    annualization: f64,
) -> Result<FactorModelResult, ModelError> {
    let rf = mean(risk_free)?;
    let mu_m = mean(total)?;
    let var_m = sample_variance(total)?;

    let design = excess.insert_axis(Axis(1));
    let n = returns.ncols();
    let mut betas = Array1::zeros(n);
    let mut idiosyncratic_variances = Array1::zeros(n);
    for (j, y) in returns.columns().into_iter().enumerate() {
        let fit = regress(design, y, true).map_err(|e| match e {
            MathError::SingularMatrix => ModelError::SingularDesign { date },
            other => ModelError::Math(other),
        })?;
        betas[j] = fit.coefficients[0];
        idiosyncratic_variances[j] = fit.residual_variance;
    }

    let expected_returns = betas.mapv(|b| (rf + (mu_m - rf) * b) * annualization);
    let systematic = Array2::from_shape_fn((n, n), |(i, j)| {
        var_m * (betas[i] * betas[j]) * annualization
    });
    let idiosyncratic = Array2::from_diag(&(&idiosyncratic_variances * annualization));
    let covariance = &systematic + &idiosyncratic;

    Ok(FactorModelResult {
        expected_returns,
        betas,
        idiosyncratic_variances,
        covariance: CovarianceMatrix::new(covariance)?,
        systematic: CovarianceMatrix::new(systematic)?,
        idiosyncratic: CovarianceMatrix::new(idiosyncratic)?,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ikaros_primitives::{TimeSeries, instrument_ids};
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    use super::*;

    fn calendar(len: usize) -> Vec<Date> {
        Date::from_ymd_opt(2022, 1, 3).unwrap().iter_days().take(len).collect()
    }

    fn fixture(len: usize, noise: f64) -> (ReturnMatrix, BenchmarkSeries) {
        let mut rng = StdRng::seed_from_u64(42);
        let market = Normal::new(0.0005, 0.01).unwrap();
        let eps = Normal::new(0.0, noise.max(f64::MIN_POSITIVE)).unwrap();
        let dates = calendar(len);
        let rf = Array1::from_elem(len, 0.0001);
        let total: Array1<f64> = (0..len).map(|_| market.sample(&mut rng)).collect();
        let excess = &total - &rf;
        let betas = [0.8, 1.2];
        let values = Array2::from_shape_fn((len, 2), |(t, j)| {
            let e = if noise > 0.0 { eps.sample(&mut rng) } else { 0.0 };
            0.0002 + betas[j] * excess[t] + e
        });
        let returns = ReturnMatrix::new(dates.clone(), instrument_ids(["A", "B"]), values).unwrap();
        let benchmark = BenchmarkSeries {
            excess: TimeSeries::new(dates.clone(), excess).unwrap(),
            total: TimeSeries::new(dates.clone(), total).unwrap(),
            risk_free: TimeSeries::new(dates, rf).unwrap(),
        };
        (returns, benchmark)
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = FactorModelConfig::default();
        assert_eq!(config.window, 126);
        assert_eq!(config.annualization, 252.0);
        assert!(RollingFactorModel::new(FactorModelConfig { window: 2, ..config }).is_err());
        assert!(
            RollingFactorModel::new(FactorModelConfig { annualization: 0.0, ..config }).is_err()
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: FactorModelConfig = serde_json::from_str(r#"{"window": 60}"#).unwrap();
        assert_eq!(config, FactorModelConfig { window: 60, annualization: 252.0 });
    }

    #[test]
    fn one_result_per_window_end_date() {
        let (returns, benchmark) = fixture(40, 0.0);
        let model =
            RollingFactorModel::new(FactorModelConfig { window: 30, annualization: 252.0 }).unwrap();
        let out = model.estimate(&returns, &benchmark).unwrap();

        let dates = calendar(40);
        assert_eq!(out.estimates().len(), 10);
        assert!(out.estimates().is_complete());
        assert_eq!(out.estimates().values().first().map(|(d, _)| *d), Some(dates[30]));
        assert_eq!(out.estimates().values().last().map(|(d, _)| *d), Some(dates[39]));
    }

    #[test]
    fn expected_return_follows_capm() {
        let (returns, benchmark) = fixture(60, 0.0);
        let model =
            RollingFactorModel::new(FactorModelConfig { window: 50, annualization: 252.0 }).unwrap();
        let date = calendar(60)[55];
        let result = model.estimate_at(&returns, &benchmark, date).unwrap();

        let total = benchmark.total.window(5, 50);
        let mu_m = total.mean().unwrap();
        let rf = 0.0001;
        for (j, beta) in [0.8, 1.2].into_iter().enumerate() {
            assert_abs_diff_eq!(result.betas[j], beta, epsilon = 1e-9);
            assert_abs_diff_eq!(
                result.expected_returns[j],
                (rf + (mu_m - rf) * beta) * 252.0,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn decomposition_holds_with_noise() {
        let (returns, benchmark) = fixture(80, 0.005);
        let model =
            RollingFactorModel::new(FactorModelConfig { window: 40, annualization: 252.0 }).unwrap();
        let out = model.estimate(&returns, &benchmark).unwrap();
        for (_, result) in out.estimates().values() {
            assert!(result.decomposition_error() < 1e-12);
            assert!(result.idiosyncratic_variances.iter().all(|v| *v > 0.0));
        }
        assert_eq!(out.covariance().len(), 40);
    }

    #[test]
    fn flat_benchmark_window_is_isolated() {
        let (returns, mut benchmark) = fixture(40, 0.0);
        // Constant benchmark excess over the first 25 observations makes the
        // earliest windows singular.
        let dates = calendar(40);
        let mut excess = benchmark.excess.values().clone();
        excess.slice_axis_mut(Axis(0), (0..25).into()).fill(0.001);
        benchmark.excess = TimeSeries::new(dates.clone(), excess).unwrap();

        let model =
            RollingFactorModel::new(FactorModelConfig { window: 20, annualization: 252.0 }).unwrap();
        let out = model.estimate(&returns, &benchmark).unwrap();

        assert_eq!(out.estimates().len(), 20);
        assert_eq!(
            out.estimates().failures().get(&dates[20]),
            Some(&ModelError::SingularDesign { date: dates[20] })
        );
        assert_eq!(out.estimates().failures().len(), 6);
        assert!(out.estimates().values().contains(&dates[26]));
    }

    #[test]
    fn estimate_at_requires_full_window() {
        let (returns, benchmark) = fixture(30, 0.0);
        let model =
            RollingFactorModel::new(FactorModelConfig { window: 20, annualization: 252.0 }).unwrap();
        let err = model.estimate_at(&returns, &benchmark, calendar(30)[10]).unwrap_err();
        assert_eq!(err, ModelError::InsufficientWindow { required: 20, actual: 10 });
    }
}
