//! Signal-driven strategies: cross-sectional rank portfolios and pairs.

use ikaros_math::{normal_cdf, rank_to_unit_interval};
use ikaros_primitives::{InstrumentId, PortfolioWeights, ReturnMatrix, RollingEstimate, TimeSeries};
use ikaros_traits::{Instrument, MarketDataProvider, SeriesTransform, Signal, SignalError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{PortfolioError, SignalPanel, TrailingZScore, WeightSeries, signal_panel};

/// Rank weights for every date of a signal panel.
///
/// Each cross-section is mapped onto `[-1, 1]` by rank; instruments without
/// a value get zero weight.
#[must_use]
pub fn rank_weights(panel: &SignalPanel) -> WeightSeries {
    let outcomes = panel.dates().iter().enumerate().map(|(t, date)| {
        let weights = rank_to_unit_interval(panel.values().row(t));
        (*date, Ok::<_, PortfolioError>(PortfolioWeights::new(weights)))
    });
    WeightSeries::new(panel.instruments().to_vec(), RollingEstimate::from_outcomes(outcomes))
}

/// Long/short portfolio ranked on a single signal.
#[derive(Debug)]
pub struct RankPortfolio {
    weights: WeightSeries,
}

impl RankPortfolio {
    /// Build from a precomputed signal panel.
    #[must_use]
    pub fn from_panel(panel: &SignalPanel) -> Self {
        Self { weights: rank_weights(panel) }
    }

    /// Evaluate `signal` for every instrument and rank the results.
    ///
    /// # Errors
    /// Returns `PortfolioError::Signal` if the signal fails for an instrument.
    pub fn new(
        signal: &dyn Signal,
        instruments: &[InstrumentId],
        provider: &dyn MarketDataProvider,
    ) -> Result<Self, PortfolioError> {
        let panel = signal_panel(signal, instruments, provider)?;
        Ok(Self::from_panel(&panel))
    }

    /// Per-date weights.
    #[must_use]
    pub const fn weights(&self) -> &WeightSeries {
        &self.weights
    }

    /// Realized returns with one-period-lagged weights.
    #[must_use]
    pub fn returns(&self, returns: &ReturnMatrix) -> TimeSeries {
        self.weights.lagged_returns(returns)
    }
}

/// How two signals are combined into one relative signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeMeasure {
    /// `first / second`.
    #[default]
    Ratio,
    /// `first - second`.
    Difference,
}

impl RelativeMeasure {
    fn apply(self, first: f64, second: f64) -> f64 {
        match self {
            Self::Ratio => first / second,
            Self::Difference => first - second,
        }
    }
}

/// Configuration for a pair trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairTradingConfig {
    /// Z-score window, including the scored observation.
    pub window: usize,
    /// Relative signal construction.
    pub relative: RelativeMeasure,
    /// Trade against the relative signal instead of with it.
    pub flip: bool,
}

impl Default for PairTradingConfig {
    fn default() -> Self {
        Self { window: 90, relative: RelativeMeasure::Ratio, flip: false }
    }
}

/// Weights of the two legs of a pair trade.
#[derive(Debug, Clone, PartialEq)]
pub struct PairWeights {
    /// Weight on the first instrument, in `(-1, 1)`.
    pub first: TimeSeries,
    /// Weight on the second instrument, always `-first`.
    pub second: TimeSeries,
}

impl PairWeights {
    /// Realized pair returns with one-period-lagged weights.
    ///
    /// The weight known at one weight date is applied to each leg's return
    /// at the next weight date; dates where either leg is missing are dropped.
    #[must_use]
    pub fn returns(&self, first: &TimeSeries, second: &TimeSeries) -> TimeSeries {
        let a = self.first.lag().zip_with(first, |w, r| w * r);
        let b = self.second.lag().zip_with(second, |w, r| w * r);
        a.zip_with(&b, |x, y| x + y).drop_non_finite()
    }
}

/// Pair trade driven by the z-score of a relative signal.
///
/// The first leg gets `2 Φ(z) - 1`, the second its negation.
#[derive(Debug, Clone, Default)]
pub struct PairTrading {
    config: PairTradingConfig,
}

impl PairTrading {
    /// Create a pair trade with a validated configuration.
    ///
    /// # Errors
    /// Returns `PortfolioError::InvalidConfig` if the window is below 3.
    pub fn new(config: PairTradingConfig) -> Result<Self, PortfolioError> {
        if config.window < 3 {
            return Err(PortfolioError::InvalidConfig(format!(
                "pair window must be at least 3, got {}",
                config.window
            )));
        }
        Ok(Self { config })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PairTradingConfig {
        &self.config
    }

    /// Leg weights from the two instruments' signal series.
    ///
    /// # Errors
    /// Returns `PortfolioError::Signal` if the relative signal is empty.
    pub fn weights(
        &self,
        first: &TimeSeries,
        second: &TimeSeries,
    ) -> Result<PairWeights, PortfolioError> {
        let relative = self.config.relative;
        // Missing spreads stay in place so no window spans a gap.
        let spread = first.zip_with(second, |a, b| relative.apply(a, b));
        let z = TrailingZScore::new(self.config.window)
            .transform(&spread)
            .map_err(SignalError::from)?;
        let sign = if self.config.flip { -1.0 } else { 1.0 };
        let first = z.map(|z| 2.0 * normal_cdf(sign * z) - 1.0);
        let second = first.map(|w| -w);
        Ok(PairWeights { first, second })
    }

    /// Evaluate `signal` on both instruments and derive leg weights.
    ///
    /// # Errors
    /// Returns `PortfolioError::Signal` if the signal fails for either leg.
    pub fn run(
        &self,
        first: &Instrument<'_>,
        second: &Instrument<'_>,
        signal: &dyn Signal,
    ) -> Result<PairWeights, PortfolioError> {
        let weights = self.weights(&signal.evaluate(first)?, &signal.evaluate(second)?)?;
        info!(
            first = %first.id(),
            second = %second.id(),
            signal = signal.name(),
            dates = weights.first.len(),
            "pair weights complete"
        );
        Ok(weights)
    }

    /// Realized returns of the pair from the instruments' closing prices.
    ///
    /// # Errors
    /// Returns `PortfolioError::Signal` if a closing price series is missing.
    pub fn realized_returns(
        weights: &PairWeights,
        first: &Instrument<'_>,
        second: &Instrument<'_>,
    ) -> Result<TimeSeries, PortfolioError> {
        let first = first.returns().map_err(SignalError::from)?;
        let second = second.returns().map_err(SignalError::from)?;
        Ok(weights.returns(&first, &second))
    }
}
