//! In-memory market data provider.

use std::collections::HashMap;

use ikaros_primitives::{InstrumentId, ReturnMatrix, TimeSeries};
use ikaros_traits::{
    BenchmarkProvider, BenchmarkSeries, MarketDataProvider, PriceField, ProviderError,
};

use crate::{UtilsError, point_in_time};

/// Market data held in memory, keyed by instrument and field.
///
/// Fundamentals are served as stored; use
/// [`InMemoryProvider::with_releases`] to map release-dated values onto the
/// instrument's trading dates first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    prices: HashMap<(InstrumentId, PriceField), TimeSeries>,
    fundamentals: HashMap<(InstrumentId, String), TimeSeries>,
    benchmark: Option<BenchmarkSeries>,
}

impl InMemoryProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closing prices for every column of a panel; missing values are skipped.
    #[must_use]
    pub fn from_close_panel(panel: &ReturnMatrix) -> Self {
        let mut provider = Self::new();
        for (j, id) in panel.instruments().iter().enumerate() {
            provider = provider.with_prices(id.clone(), PriceField::Close, panel.column(j));
        }
        provider
    }

    /// Add a price series.
    #[must_use]
    pub fn with_prices(mut self, id: InstrumentId, field: PriceField, series: TimeSeries) -> Self {
        self.prices.insert((id, field), series.drop_non_finite());
        self
    }

    /// Add a fundamental series that is already point-in-time.
    #[must_use]
    pub fn with_fundamental(
        mut self,
        id: InstrumentId,
        field: impl Into<String>,
        series: TimeSeries,
    ) -> Self {
        self.fundamentals.insert((id, field.into()), series);
        self
    }

    /// Add release-dated fundamentals, mapped onto the instrument's closing
    /// price dates with [`point_in_time`].
    ///
    /// # Errors
    /// Returns `UtilsError::InvalidParameter` if the instrument has no closing
    /// prices yet.
    pub fn with_releases(
        self,
        id: InstrumentId,
        field: impl Into<String>,
        releases: &TimeSeries,
    ) -> Result<Self, UtilsError> {
        let Some(close) = self.prices.get(&(id.clone(), PriceField::Close)) else {
            return Err(UtilsError::InvalidParameter(format!("no closing prices for {id}")));
        };
        let mapped = point_in_time(releases, close.dates())?;
        Ok(self.with_fundamental(id, field, mapped))
    }

    /// Set the benchmark series.
    #[must_use]
    pub fn with_benchmark(mut self, benchmark: BenchmarkSeries) -> Self {
        self.benchmark = Some(benchmark);
        self
    }

    fn has_instrument(&self, id: &InstrumentId) -> bool {
        self.prices.keys().any(|(i, _)| i == id) || self.fundamentals.keys().any(|(i, _)| i == id)
    }

    fn not_found(&self, id: &InstrumentId, field: &str) -> ProviderError {
        if self.has_instrument(id) {
            ProviderError::FieldNotFound { instrument: id.clone(), field: field.to_string() }
        } else {
            ProviderError::InstrumentNotFound(id.clone())
        }
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn price_series(
        &self,
        id: &InstrumentId,
        field: PriceField,
    ) -> Result<TimeSeries, ProviderError> {
        self.prices
            .get(&(id.clone(), field))
            .cloned()
            .ok_or_else(|| self.not_found(id, field.name()))
    }

    fn fundamental_series(
        &self,
        id: &InstrumentId,
        field: &str,
    ) -> Result<TimeSeries, ProviderError> {
        self.fundamentals
            .get(&(id.clone(), field.to_string()))
            .cloned()
            .ok_or_else(|| self.not_found(id, field))
    }
}

impl BenchmarkProvider for InMemoryProvider {
    fn benchmark(&self) -> Result<BenchmarkSeries, ProviderError> {
        self.benchmark
            .clone()
            .ok_or_else(|| ProviderError::Unavailable("no benchmark loaded".to_string()))
    }
}
