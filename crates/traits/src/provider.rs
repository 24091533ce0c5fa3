//! Market and benchmark data provider abstractions.

use std::fmt;

use ikaros_primitives::{InstrumentId, TimeSeries};

/// Errors reported by data providers.
///
/// Network and storage failures are absorbed by the provider and surface here
/// only as `Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider knows nothing about this instrument.
    #[error("instrument not found: {0}")]
    InstrumentNotFound(InstrumentId),

    /// The instrument has no series with this field name.
    #[error("field {field} not found for {instrument}")]
    FieldNotFound {
        /// Instrument that was queried.
        instrument: InstrumentId,
        /// Requested field name.
        field: String,
    },

    /// Data could not be produced.
    #[error("data unavailable: {0}")]
    Unavailable(String),
}

/// Daily price fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    /// Opening price.
    Open,
    /// Intraday high.
    High,
    /// Intraday low.
    Low,
    /// (Adjusted) closing price.
    Close,
    /// Traded volume.
    Volume,
}

impl PriceField {
    /// All price fields.
    pub const ALL: [Self; 5] = [Self::Open, Self::High, Self::Low, Self::Close, Self::Volume];

    /// Canonical field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "PriceOpen",
            Self::High => "PriceHigh",
            Self::Low => "PriceLow",
            Self::Close => "PriceClose",
            Self::Volume => "Volume",
        }
    }

    /// Look up a price field by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of per-instrument price and fundamental series.
///
/// Fundamental series must already be point-in-time: the value at a date is
/// the value known as of that date.
pub trait MarketDataProvider: Send + Sync {
    /// Date-indexed price series for one field.
    ///
    /// # Errors
    /// Returns `ProviderError` if the instrument or field is unknown.
    fn price_series(&self, id: &InstrumentId, field: PriceField)
    -> Result<TimeSeries, ProviderError>;

    /// Date-indexed fundamental series for an arbitrary named field
    /// (e.g. `TotalRevenue`, `ShareIssued`).
    ///
    /// # Errors
    /// Returns `ProviderError` if the instrument or field is unknown.
    fn fundamental_series(&self, id: &InstrumentId, field: &str)
    -> Result<TimeSeries, ProviderError>;
}

/// Benchmark inputs of the single-factor model.
#[derive(Debug, Clone)]
pub struct BenchmarkSeries {
    /// Benchmark return in excess of the risk-free rate.
    pub excess: TimeSeries,
    /// Benchmark total return.
    pub total: TimeSeries,
    /// Risk-free rate per period.
    pub risk_free: TimeSeries,
}

/// Source of benchmark series.
pub trait BenchmarkProvider: Send + Sync {
    /// Benchmark excess return, total return and risk-free rate.
    ///
    /// # Errors
    /// Returns `ProviderError::Unavailable` if the series cannot be produced.
    fn benchmark(&self) -> Result<BenchmarkSeries, ProviderError>;
}

/// Handle coupling an instrument identifier with its data provider.
///
/// This is the one place a field name is resolved: price fields first, then
/// fundamentals.
#[derive(Clone, Copy)]
pub struct Instrument<'a> {
    id: &'a InstrumentId,
    provider: &'a dyn MarketDataProvider,
}

impl<'a> Instrument<'a> {
    /// Create a handle.
    #[must_use]
    pub const fn new(id: &'a InstrumentId, provider: &'a dyn MarketDataProvider) -> Self {
        Self { id, provider }
    }

    /// Instrument identifier.
    #[must_use]
    pub const fn id(&self) -> &InstrumentId {
        self.id
    }

    /// Resolve a field by name.
    ///
    /// # Errors
    /// Returns `ProviderError::FieldNotFound` if neither a price nor a
    /// fundamental field with this name exists.
    pub fn field(&self, name: &str) -> Result<TimeSeries, ProviderError> {
        match PriceField::from_name(name) {
            Some(field) => self.provider.price_series(self.id, field),
            None => self.provider.fundamental_series(self.id, name),
        }
    }

    /// Closing prices.
    ///
    /// # Errors
    /// Returns `ProviderError` if the provider has no closing prices.
    pub fn close(&self) -> Result<TimeSeries, ProviderError> {
        self.provider.price_series(self.id, PriceField::Close)
    }

    /// Simple daily returns of the closing price.
    ///
    /// # Errors
    /// Returns `ProviderError` if the provider has no closing prices.
    pub fn returns(&self) -> Result<TimeSeries, ProviderError> {
        Ok(self.close()?.pct_change())
    }

    /// Market capitalization: closing price times shares issued.
    ///
    /// # Errors
    /// Returns `ProviderError` if either series is missing.
    pub fn market_cap(&self) -> Result<TimeSeries, ProviderError> {
        let shares = self.field("ShareIssued")?;
        Ok(self.close()?.zip_with(&shares, |p, s| p * s))
    }
}

impl fmt::Debug for Instrument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrument").field("id", self.id).finish_non_exhaustive()
    }
}
