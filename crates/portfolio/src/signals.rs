//! Cross-sectional signal panels.

use std::collections::BTreeSet;

use ikaros_math::{MathError, trailing_zscore};
use ikaros_primitives::{Date, InstrumentId, ReturnMatrix, TimeSeries};
use ikaros_traits::{
    Instrument, MarketDataProvider, SeriesTransform, Signal, SignalError, TransformError,
};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::PortfolioError;

/// Date by instrument panel of signal values; NaN marks a missing value.
pub type SignalPanel = ReturnMatrix;

/// Assemble per-instrument series into a panel over the union of their dates.
///
/// # Errors
/// Returns `PortfolioError::Primitives` if an instrument appears twice.
pub fn panel_from_series(
    columns: Vec<(InstrumentId, TimeSeries)>,
) -> Result<SignalPanel, PortfolioError> {
    let dates: Vec<Date> = columns
        .iter()
        .flat_map(|(_, series)| series.dates().iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut values = Array2::from_elem((dates.len(), columns.len()), f64::NAN);
    let mut instruments = Vec::with_capacity(columns.len());
    for (j, (id, series)) in columns.into_iter().enumerate() {
        let mut t = 0;
        for (date, value) in series.iter() {
            // Both date lists are sorted and the column's dates are a subset.
            while dates[t] < date {
                t += 1;
            }
            values[[t, j]] = value;
        }
        instruments.push(id);
    }
    Ok(ReturnMatrix::new(dates, instruments, values)?)
}

fn evaluate_all<F>(
    instruments: &[InstrumentId],
    provider: &dyn MarketDataProvider,
    f: F,
) -> Result<SignalPanel, PortfolioError>
where
    F: Fn(&Instrument<'_>) -> Result<TimeSeries, SignalError> + Sync,
{
    let columns = instruments
        .par_iter()
        .map(|id| {
            let series = f(&Instrument::new(id, provider))?;
            Ok((id.clone(), series))
        })
        .collect::<Result<Vec<_>, PortfolioError>>()?;
    panel_from_series(columns)
}

/// Evaluate a signal for every instrument.
///
/// # Errors
/// Returns `PortfolioError::Signal` for the first instrument the signal
/// cannot be evaluated on.
pub fn signal_panel(
    signal: &dyn Signal,
    instruments: &[InstrumentId],
    provider: &dyn MarketDataProvider,
) -> Result<SignalPanel, PortfolioError> {
    let panel = evaluate_all(instruments, provider, |inst| signal.evaluate(inst))?;
    debug!(signal = signal.name(), dates = panel.n_dates(), "signal panel built");
    Ok(panel)
}

/// Closing price panel.
///
/// # Errors
/// Returns `PortfolioError::Signal` if an instrument has no closing prices.
pub fn close_panel(
    instruments: &[InstrumentId],
    provider: &dyn MarketDataProvider,
) -> Result<SignalPanel, PortfolioError> {
    evaluate_all(instruments, provider, |inst| Ok(inst.close()?))
}

/// Market capitalization panel: closing price times shares issued.
///
/// # Errors
/// Returns `PortfolioError::Signal` if an instrument lacks either series.
pub fn market_cap_panel(
    instruments: &[InstrumentId],
    provider: &dyn MarketDataProvider,
) -> Result<SignalPanel, PortfolioError> {
    evaluate_all(instruments, provider, |inst| Ok(inst.market_cap()?))
}

/// Trailing z-score of each value against the observations before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingZScore {
    /// Observations per window, including the scored one.
    pub window: usize,
}

impl Default for TrailingZScore {
    fn default() -> Self {
        Self { window: 21 }
    }
}

impl TrailingZScore {
    /// Create a transform with the given window.
    #[must_use]
    pub const fn new(window: usize) -> Self {
        Self { window }
    }
}

impl SeriesTransform for TrailingZScore {
    /// Dates without a full window, or with a flat one, are dropped.
    fn transform(&self, series: &TimeSeries) -> Result<TimeSeries, TransformError> {
        if series.is_empty() {
            return Err(TransformError::EmptyData);
        }
        let scores = trailing_zscore(series.values().view(), self.window).map_err(|e| match e {
            MathError::InvalidParameter(msg) => TransformError::InvalidParameter(msg),
            other => TransformError::Numerical(other.to_string()),
        })?;
        let scored = TimeSeries::new(series.dates().to_vec(), scores)
            .map_err(|e| TransformError::Numerical(e.to_string()))?;
        Ok(scored.drop_non_finite())
    }

    fn name(&self) -> &str {
        "trailing_zscore"
    }
}
