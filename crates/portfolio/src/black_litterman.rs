//! Black-Litterman blending of market-implied returns with signal views.
//!
//! Per date `d`, in dependency order:
//!
//! 1. market weights from capitalizations ([`market_weights`])
//! 2. implied returns `Π = A Σ_d w_{d-1}`, with the weights of the previous
//!    capitalization date
//! 3. link matrix `P`: one rank-transformed cross-section per view
//! 4. view covariance `Ω = τ P Σ_d P'`, shrunk toward its diagonal
//! 5. posterior weights `w* = τ Σ_d⁻¹ Π + P' Ω⁻¹ q`
//!
//! Only dates with a covariance, implied returns and every view produce
//! weights.

use ikaros_math::{MathError, invert_symmetric, rank_to_unit_interval, shrink_to_diagonal};
use ikaros_model::{
    CovarianceConfig, PrecisionSeries, ShrinkageCovariance, common_dates, invert_series,
};
use ikaros_primitives::{
    Date, DateIndexed, DatedSeries, InstrumentId, PortfolioWeights, ReturnMatrix, RollingEstimate,
    ViewSpecification,
};
use ikaros_traits::{MarketDataProvider, Signal};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    MarketWeighting, PortfolioError, SignalPanel, WeightSeries, close_panel, market_cap_panel,
    market_weights, mean_variance::precision_failure, signal_panel,
};

/// Market-implied excess returns `A Σ w`.
///
/// # Errors
/// Returns `PortfolioError::InstrumentMismatch` if the weights do not match
/// the covariance dimension.
pub fn implied_returns(
    covariance: &Array2<f64>,
    weights: &Array1<f64>,
    risk_aversion: f64,
) -> Result<Array1<f64>, PortfolioError> {
    if covariance.dim() != (weights.len(), weights.len()) {
        return Err(PortfolioError::InstrumentMismatch(format!(
            "{} weights for a {}x{} covariance",
            weights.len(),
            covariance.nrows(),
            covariance.ncols()
        )));
    }
    Ok(covariance.dot(weights) * risk_aversion)
}

/// Link matrix at `date`: row `k` is the rank transform of view `k`.
///
/// Returns `None` if a panel has no row for `date`. Missing instrument values
/// get a zero loading.
#[must_use]
pub fn link_matrix(views: &[SignalPanel], date: Date) -> Option<Array2<f64>> {
    let n = views.first().map_or(0, ReturnMatrix::n_instruments);
    let mut link = Array2::zeros((views.len(), n));
    for (k, panel) in views.iter().enumerate() {
        let row = panel.row_at(date)?;
        link.row_mut(k).assign(&rank_to_unit_interval(row));
    }
    Some(link)
}

/// Assemble views with `Ω = τ P Σ P'` shrunk toward its diagonal.
///
/// # Errors
/// Returns `PortfolioError::InstrumentMismatch` if `P` and `Σ` disagree,
/// `PortfolioError::Math` for a shrinkage factor outside `[0, 1]`, and
/// `PortfolioError::Primitives` if `q` does not have one entry per view.
pub fn view_specification(
    link: Array2<f64>,
    covariance: &Array2<f64>,
    tau: f64,
    shrinkage: f64,
    view_returns: Array1<f64>,
) -> Result<ViewSpecification, PortfolioError> {
    if link.ncols() != covariance.nrows() || !covariance.is_square() {
        return Err(PortfolioError::InstrumentMismatch(format!(
            "link matrix has {} columns for a {}x{} covariance",
            link.ncols(),
            covariance.nrows(),
            covariance.ncols()
        )));
    }
    let omega = link.dot(covariance).dot(&link.t()) * tau;
    let omega = shrink_to_diagonal(&omega, shrinkage)?;
    Ok(ViewSpecification::new(link, omega, view_returns)?)
}

/// Posterior weights `τ Σ⁻¹ Π + P' Ω⁻¹ q`.
///
/// # Errors
/// Returns `PortfolioError::InstrumentMismatch` if the pieces disagree on
/// the number of instruments or views.
pub fn posterior_weights(
    precision: &Array2<f64>,
    implied: &Array1<f64>,
    views: &ViewSpecification,
    view_precision: &Array2<f64>,
    tau: f64,
) -> Result<Array1<f64>, PortfolioError> {
    let n = implied.len();
    let m = views.n_views();
    if precision.dim() != (n, n) || views.n_instruments() != n || view_precision.dim() != (m, m) {
        return Err(PortfolioError::InstrumentMismatch(format!(
            "{n} implied returns, {}x{} precision, {m} views on {} instruments",
            precision.nrows(),
            precision.ncols(),
            views.n_instruments()
        )));
    }
    let market = precision.dot(implied) * tau;
    let blended = views.link.t().dot(&view_precision.dot(&views.view_returns));
    Ok(market + blended)
}

/// Configuration for the Black-Litterman pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackLittermanConfig {
    /// Covariance estimation; the shrinkage factor also applies to `Ω`.
    pub covariance: CovarianceConfig,
    /// Risk-aversion scalar `A`.
    pub risk_aversion: f64,
    /// Uncertainty scaling `τ`.
    pub tau: f64,
    /// Capitalization to weight rule.
    pub weighting: MarketWeighting,
}

impl Default for BlackLittermanConfig {
    fn default() -> Self {
        Self {
            covariance: CovarianceConfig::default(),
            risk_aversion: 1.0,
            tau: 1.0,
            weighting: MarketWeighting::default(),
        }
    }
}

impl BlackLittermanConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` for invalid settings.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        self.covariance.validate().map_err(|e| PortfolioError::InvalidConfig(e.to_string()))?;
        if !(self.risk_aversion.is_finite() && self.risk_aversion > 0.0) {
            return Err(PortfolioError::InvalidConfig(format!(
                "risk aversion must be positive, got {}",
                self.risk_aversion
            )));
        }
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err(PortfolioError::InvalidConfig(format!(
                "tau must be positive, got {}",
                self.tau
            )));
        }
        Ok(())
    }
}

/// Intermediate and final results of a Black-Litterman run.
#[derive(Debug)]
pub struct BlackLittermanOutput {
    /// Instrument ordering of every vector and matrix.
    pub instruments: Vec<InstrumentId>,
    /// Market weights per capitalization date.
    pub market_weights: DatedSeries<PortfolioWeights>,
    /// Lagged market-implied returns per covariance date.
    pub implied_returns: DatedSeries<Array1<f64>>,
    /// Link matrix, view covariance and view returns per date.
    pub views: DatedSeries<ViewSpecification>,
    /// Posterior weights.
    pub weights: WeightSeries,
}

/// Rolling Black-Litterman portfolio.
#[derive(Debug, Clone, Default)]
pub struct BlackLitterman {
    config: BlackLittermanConfig,
}

impl BlackLitterman {
    /// Create a blender with a validated configuration.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` for an invalid configuration.
    pub fn new(config: BlackLittermanConfig) -> Result<Self, PortfolioError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &BlackLittermanConfig {
        &self.config
    }

    /// Blend market-implied returns with one view per signal panel.
    ///
    /// `caps` and every view panel must list the instruments of `returns` in
    /// the same order. `view_returns` holds one expected return per view.
    ///
    /// # Errors
    /// Returns `PortfolioError::ViewCountMismatch` if the views and their
    /// returns differ in number (or there are none),
    /// `PortfolioError::InstrumentMismatch` for a panel over other instruments,
    /// and `PortfolioError::Model` if the view panels share no date.
    pub fn run(
        &self,
        returns: &ReturnMatrix,
        caps: &SignalPanel,
        views: &[SignalPanel],
        view_returns: &Array1<f64>,
    ) -> Result<BlackLittermanOutput, PortfolioError> {
        if views.is_empty() || views.len() != view_returns.len() {
            return Err(PortfolioError::ViewCountMismatch {
                views: views.len(),
                returns: view_returns.len(),
            });
        }
        let instruments = returns.instruments();
        for (name, panel) in std::iter::once(("capitalization", caps))
            .chain(views.iter().map(|v| ("view", v)))
        {
            if panel.instruments() != instruments {
                return Err(PortfolioError::InstrumentMismatch(format!(
                    "{name} panel instruments differ from the return matrix"
                )));
            }
        }

        let BlackLittermanConfig { covariance: cov_config, risk_aversion, tau, weighting } =
            self.config;
        let covariance = ShrinkageCovariance::new(cov_config)?.estimate(returns);
        let precision = invert_series(&covariance);
        let market = market_weights(caps, weighting);

        let mut implied = DatedSeries::new();
        for (date, sigma) in covariance.matrices() {
            if !market.contains(date) {
                continue;
            }
            if let Some((_, previous)) = market.previous(date) {
                let pi = implied_returns(sigma.matrix(), previous.weights(), risk_aversion)?;
                implied.insert(*date, pi)?;
            }
        }

        let panels: Vec<&dyn DateIndexed> = views.iter().map(|v| v as &dyn DateIndexed).collect();
        let link_dates = common_dates(&panels)?;

        let view_dates: Vec<Date> = link_dates
            .into_iter()
            .filter(|d| covariance.matrices().contains(d))
            .collect();
        let specs = view_dates
            .into_par_iter()
            .filter_map(|date| {
                let link = link_matrix(views, date)?;
                let sigma = covariance.matrices().get(&date)?;
                let spec = view_specification(
                    link,
                    sigma.matrix(),
                    tau,
                    cov_config.shrinkage,
                    view_returns.clone(),
                );
                Some(spec.map(|s| (date, s)))
            })
            .collect::<Result<Vec<_>, PortfolioError>>()?;
        let specs = DatedSeries::from_unique(specs)?;

        let dates: Vec<Date> = implied.dates().filter(|d| specs.contains(d)).copied().collect();
        debug!(
            covariance = covariance.len(),
            implied = implied.len(),
            views = specs.len(),
            blended = dates.len(),
            "black-litterman dates"
        );

        let outcomes: Vec<(Date, Result<PortfolioWeights, PortfolioError>)> = dates
            .into_par_iter()
            .map(|date| {
                let outcome = match (implied.get(&date), specs.get(&date)) {
                    (Some(pi), Some(spec)) => self.blend(date, &precision, pi, spec),
                    _ => Err(PortfolioError::SingularCovariance { date }),
                };
                (date, outcome)
            })
            .collect();

        let estimates = RollingEstimate::from_outcomes(outcomes);
        for (date, error) in estimates.failures() {
            warn!(%date, %error, "black-litterman weights failed");
        }
        info!(
            dates = estimates.len(),
            failed = estimates.failures().len(),
            views = views.len(),
            "black-litterman weights complete"
        );

        Ok(BlackLittermanOutput {
            instruments: instruments.to_vec(),
            market_weights: market,
            implied_returns: implied,
            views: specs,
            weights: WeightSeries::new(instruments.to_vec(), estimates),
        })
    }

    /// Evaluate signals through a provider and run the blend.
    ///
    /// Returns come from closing prices, capitalizations from closing price
    /// times shares issued.
    ///
    /// # Errors
    /// Returns `PortfolioError::Signal` if a series cannot be fetched or a
    /// signal cannot be evaluated, and any error of [`BlackLitterman::run`].
    pub fn run_with_provider(
        &self,
        instruments: &[InstrumentId],
        provider: &dyn MarketDataProvider,
        signals: &[&dyn Signal],
        view_returns: &Array1<f64>,
    ) -> Result<BlackLittermanOutput, PortfolioError> {
        let prices = close_panel(instruments, provider)?;
        let returns = ReturnMatrix::from_prices(
            prices.dates().to_vec(),
            prices.instruments().to_vec(),
            prices.values().clone(),
        )?;
        let caps = market_cap_panel(instruments, provider)?;
        let views = signals
            .iter()
            .map(|signal| signal_panel(*signal, instruments, provider))
            .collect::<Result<Vec<_>, _>>()?;
        self.run(&returns, &caps, &views, view_returns)
    }

    fn blend(
        &self,
        date: Date,
        precision: &PrecisionSeries,
        implied: &Array1<f64>,
        spec: &ViewSpecification,
    ) -> Result<PortfolioWeights, PortfolioError> {
        let Some(inverse) = precision.values().get(&date) else {
            return Err(precision_failure(precision, date));
        };
        let view_precision = invert_symmetric(&spec.view_covariance).map_err(|e| match e {
            MathError::SingularMatrix => PortfolioError::SingularCovariance { date },
            other => PortfolioError::Math(other),
        })?;
        let w = posterior_weights(inverse, implied, spec, &view_precision, self.config.tau)?;
        Ok(PortfolioWeights::new(w))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ikaros_math::invert;
    use ikaros_primitives::instrument_ids;
    use ndarray::{Axis, array};
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};
    use rstest::rstest;

    use super::*;
    use crate::signals::tests::{MapProvider, series};

    fn sigma() -> Array2<f64> {
        array![[0.04, 0.01, 0.00], [0.01, 0.09, 0.02], [0.00, 0.02, 0.0625]]
    }

    fn calendar(len: usize) -> Vec<Date> {
        Date::from_ymd_opt(2023, 1, 2).unwrap().iter_days().take(len).collect()
    }

    fn random_returns(len: usize, seed: u64) -> ReturnMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.01).unwrap();
        let values = Array2::from_shape_fn((len, 3), |_| noise.sample(&mut rng));
        ReturnMatrix::new(calendar(len), instrument_ids(["A", "B", "C"]), values).unwrap()
    }

    fn panel(dates: Vec<Date>, values: Array2<f64>) -> SignalPanel {
        ReturnMatrix::new(dates, instrument_ids(["A", "B", "C"]), values).unwrap()
    }

    #[test]
    fn implied_returns_scale_with_risk_aversion() {
        let w = array![0.5, 0.3, 0.2];
        let pi = implied_returns(&sigma(), &w, 2.5).unwrap();
        let expected = sigma().dot(&w) * 2.5;
        for (a, b) in pi.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-15);
        }
        assert!(implied_returns(&sigma(), &array![1.0], 1.0).is_err());
    }

    #[test]
    fn link_rows_are_ranks_with_missing_as_zero() {
        let dates = calendar(2);
        let value = panel(dates.clone(), array![[3.0, 1.0, 2.0], [1.0, f64::NAN, 5.0]]);
        let momentum = panel(dates.clone(), array![[0.1, 0.2, 0.3], [0.0, 0.0, 0.0]]);

        let p = link_matrix(&[value.clone(), momentum.clone()], dates[0]).unwrap();
        assert_eq!(p, array![[1.0, -1.0, 0.0], [-1.0, 0.0, 1.0]]);

        let p = link_matrix(&[value, momentum], dates[1]).unwrap();
        assert_eq!(p.row(0), array![-1.0, 0.0, 1.0]);
        assert_eq!(p.row(1), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn link_matrix_requires_every_view() {
        let dates = calendar(2);
        let only_first = panel(dates[..1].to_vec(), array![[1.0, 2.0, 3.0]]);
        assert!(link_matrix(&[only_first], dates[1]).is_none());
    }

    #[rstest]
    #[case(1.0)]
    #[case(0.5)]
    fn omega_is_shrunk_view_covariance(#[case] shrinkage: f64) {
        let link = array![[1.0, 0.0, -1.0], [-1.0, 1.0, 0.0]];
        let spec = view_specification(link.clone(), &sigma(), 0.5, shrinkage, array![0.02, 0.01])
            .unwrap();
        let full = link.dot(&sigma()).dot(&link.t()) * 0.5;
        assert_abs_diff_eq!(spec.view_covariance[[0, 0]], full[[0, 0]], epsilon = 1e-15);
        assert_abs_diff_eq!(spec.view_covariance[[1, 1]], full[[1, 1]], epsilon = 1e-15);
        assert_abs_diff_eq!(
            spec.view_covariance[[0, 1]],
            full[[0, 1]] * shrinkage,
            epsilon = 1e-15
        );
    }

    #[test]
    fn view_returns_must_match_views() {
        let link = array![[1.0, 0.0, -1.0]];
        assert!(matches!(
            view_specification(link, &sigma(), 1.0, 0.8, array![0.1, 0.2]),
            Err(PortfolioError::Primitives(_))
        ));
    }

    #[test]
    fn vanishing_view_confidence_leaves_market_term() {
        let tau = 0.7;
        let precision = invert(&sigma()).unwrap();
        let pi = implied_returns(&sigma(), &array![0.5, 0.3, 0.2], 1.0).unwrap();
        let market = precision.dot(&pi) * tau;

        let link = array![[1.0, 0.0, -1.0], [-1.0, 1.0, 0.0]];
        let spec = view_specification(link, &sigma(), tau, 0.8, array![0.05, -0.03]).unwrap();

        // Exact limit.
        let w = posterior_weights(&precision, &pi, &spec, &Array2::zeros((2, 2)), tau).unwrap();
        assert_eq!(w, market);

        // Ω scaled up: the view term shrinks in proportion.
        for scale in [1e3, 1e6, 1e9] {
            let view_precision = invert(&(&spec.view_covariance * scale)).unwrap();
            let w = posterior_weights(&precision, &pi, &spec, &view_precision, tau).unwrap();
            let gap = (&w - &market).iter().fold(0.0_f64, |m, d| m.max(d.abs()));
            assert!(gap < 10.0 / scale, "scale {scale}: gap {gap}");
        }
        // The market term alone recovers w_market scaled by τ A.
        assert_abs_diff_eq!(market.sum(), tau, epsilon = 1e-12);
    }

    #[test]
    fn pipeline_uses_previous_market_weights() {
        let len = 140;
        let window = 100;
        let returns = random_returns(len, 21);
        let dates = calendar(len);
        // Caps change every day so a lag mistake shows up.
        let caps = panel(
            dates.clone(),
            Array2::from_shape_fn((len, 3), |(t, j)| 100.0 + (t * (j + 1)) as f64),
        );
        // A view that exists only from day 110 on.
        let view = panel(
            dates[110..].to_vec(),
            Array2::from_shape_fn((len - 110, 3), |(t, j)| ((t + j) % 3) as f64),
        );

        let config = BlackLittermanConfig {
            covariance: CovarianceConfig { window, ..CovarianceConfig::default() },
            ..BlackLittermanConfig::default()
        };
        let output = BlackLitterman::new(config)
            .unwrap()
            .run(&returns, &caps, &[view], &array![0.03])
            .unwrap();

        assert_eq!(output.market_weights.len(), len);
        assert_eq!(output.implied_returns.len(), len - window);
        assert_eq!(output.views.len(), len - 110);
        assert_eq!(output.weights.estimates().len(), len - 110);
        assert!(output.weights.estimates().is_complete());

        let d = dates[120];
        let sigma = ShrinkageCovariance::new(config.covariance).unwrap().estimate(&returns);
        let sigma = sigma.matrices().get(&d).unwrap().matrix().clone();
        let w_prev = output.market_weights.get(&dates[119]).unwrap().weights();
        let pi = output.implied_returns.get(&d).unwrap();
        let expected = sigma.dot(w_prev);
        for (a, b) in pi.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-15);
        }

        let spec = output.views.get(&d).unwrap();
        let posterior = posterior_weights(
            &invert_symmetric(&sigma).unwrap(),
            pi,
            spec,
            &invert_symmetric(&spec.view_covariance).unwrap(),
            1.0,
        )
        .unwrap();
        let got = output.weights.get(&d).unwrap().weights();
        for (a, b) in got.iter().zip(posterior.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let returns = random_returns(30, 1);
        let caps = panel(calendar(30), Array2::ones((30, 3)));
        let view = panel(calendar(30), Array2::ones((30, 3)));
        let bl = BlackLitterman::default();

        assert!(matches!(
            bl.run(&returns, &caps, &[view.clone()], &array![0.1, 0.2]),
            Err(PortfolioError::ViewCountMismatch { views: 1, returns: 2 })
        ));
        assert!(matches!(
            bl.run(&returns, &caps, &[], &Array1::zeros(0)),
            Err(PortfolioError::ViewCountMismatch { views: 0, .. })
        ));

        let other = ReturnMatrix::new(
            calendar(30),
            instrument_ids(["A", "B", "D"]),
            Array2::ones((30, 3)),
        )
        .unwrap();
        assert!(matches!(
            bl.run(&returns, &caps, &[other], &array![0.1]),
            Err(PortfolioError::InstrumentMismatch(_))
        ));
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(1.0, -1.0)]
    #[case(f64::INFINITY, 1.0)]
    fn invalid_config(#[case] risk_aversion: f64, #[case] tau: f64) {
        let config = BlackLittermanConfig { risk_aversion, tau, ..BlackLittermanConfig::default() };
        assert!(matches!(BlackLitterman::new(config), Err(PortfolioError::InvalidConfig(_))));
    }

    #[test]
    fn provider_inputs_feed_the_blend() {
        let len: usize = 40;
        let mut rng = StdRng::seed_from_u64(5);
        let noise = Normal::new(0.0, 0.01).unwrap();
        let mut provider = MapProvider::default();
        for (j, id) in ["A", "B", "C"].into_iter().enumerate() {
            let mut price = 50.0 * (j + 1) as f64;
            let closes: Vec<f64> = (0..len)
                .map(|_| {
                    price *= 1.0 + noise.sample(&mut rng);
                    price
                })
                .collect();
            let shares = vec![1000.0 * (j + 1) as f64; len];
            let revenue: Vec<f64> = (0..len).map(|t| (t + 3 * j) as f64).collect();
            provider = provider
                .with(id, "PriceClose", series(1, &closes))
                .with(id, "ShareIssued", series(1, &shares))
                .with(id, "TotalRevenue", series(1, &revenue));
        }

        let config = BlackLittermanConfig {
            covariance: CovarianceConfig { window: 20, ..CovarianceConfig::default() },
            ..BlackLittermanConfig::default()
        };
        let ratio = ikaros_traits::FieldRatio::new("TotalRevenue", "PriceClose");
        let output = BlackLitterman::new(config)
            .unwrap()
            .run_with_provider(&instrument_ids(["A", "B", "C"]), &provider, &[&ratio], &array![0.02])
            .unwrap();

        // 39 returns, 20-day window.
        assert_eq!(output.weights.estimates().len(), 19);
        let first = output.weights.weights().first().unwrap().1;
        assert_eq!(first.len(), 3);
        assert!(output.views.iter().all(|(_, v)| v.link.len_of(Axis(0)) == 1));
    }
}
