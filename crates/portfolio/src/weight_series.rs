//! Date-indexed portfolio weights.

use std::collections::BTreeMap;

use ikaros_primitives::{
    Date, DatedSeries, InstrumentId, PortfolioWeights, ReturnMatrix, RollingEstimate, TimeSeries,
};

use crate::PortfolioError;

/// Per-date portfolio weights over a fixed instrument ordering.
#[derive(Debug)]
pub struct WeightSeries {
    instruments: Vec<InstrumentId>,
    estimates: RollingEstimate<PortfolioWeights, PortfolioError>,
}

impl WeightSeries {
    /// Create a weight series.
    #[must_use]
    pub const fn new(
        instruments: Vec<InstrumentId>,
        estimates: RollingEstimate<PortfolioWeights, PortfolioError>,
    ) -> Self {
        Self { instruments, estimates }
    }

    /// Instrument ordering of every weight vector.
    #[must_use]
    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    /// Per-date weights and failures.
    #[must_use]
    pub const fn estimates(&self) -> &RollingEstimate<PortfolioWeights, PortfolioError> {
        &self.estimates
    }

    /// Successfully computed weights.
    #[must_use]
    pub const fn weights(&self) -> &DatedSeries<PortfolioWeights> {
        self.estimates.values()
    }

    /// Weights in force at `date`.
    #[must_use]
    pub fn get(&self, date: &Date) -> Option<&PortfolioWeights> {
        self.estimates.values().get(date)
    }

    /// Realized portfolio returns with one-period-lagged weights.
    ///
    /// The return at weight date `d` applies the weights of the preceding
    /// weight date to the instrument returns observed at `d`. Instruments are
    /// matched by identifier; a missing return contributes nothing.
    #[must_use]
    pub fn lagged_returns(&self, returns: &ReturnMatrix) -> TimeSeries {
        let columns: Vec<Option<usize>> =
            self.instruments.iter().map(|id| returns.instrument_index(id)).collect();

        let weights: Vec<(&Date, &PortfolioWeights)> = self.weights().iter().collect();
        let realized: BTreeMap<Date, f64> = weights
            .windows(2)
            .filter_map(|pair| {
                let (_, previous) = pair[0];
                let (date, _) = pair[1];
                let row = returns.row_at(*date)?;
                let value: f64 = previous
                    .weights()
                    .iter()
                    .zip(&columns)
                    .filter_map(|(w, col)| col.map(|j| w * row[j]))
                    .filter(|v| v.is_finite())
                    .sum();
                Some((*date, value))
            })
            .collect();
        DatedSeries::from(realized).to_time_series()
    }
}
