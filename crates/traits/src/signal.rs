//! Per-instrument signal definitions.

use ikaros_primitives::TimeSeries;

use crate::{Instrument, ProviderError, SeriesTransform, TransformError};

/// Errors raised while evaluating a signal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The provider could not supply an input series.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A transform rejected its input.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// A function from an instrument's data to a date-indexed score.
///
/// Implementations must not read values dated after the output date.
pub trait Signal: Send + Sync {
    /// Evaluate the signal for one instrument.
    ///
    /// # Errors
    /// Returns `SignalError` if an input series is missing or a transform fails.
    fn evaluate(&self, instrument: &Instrument<'_>) -> Result<TimeSeries, SignalError>;

    /// Signal name used in logs and output columns.
    fn name(&self) -> &str {
        "signal"
    }
}

impl<F> Signal for F
where
    F: Fn(&Instrument<'_>) -> Result<TimeSeries, SignalError> + Send + Sync,
{
    fn evaluate(&self, instrument: &Instrument<'_>) -> Result<TimeSeries, SignalError> {
        self(instrument)
    }
}

/// Ratio of two instrument fields, e.g. `TotalRevenue / PriceClose`.
#[derive(Debug, Clone)]
pub struct FieldRatio {
    name: String,
    numerator: String,
    denominator: String,
}

impl FieldRatio {
    /// Create a ratio signal from two field names.
    #[must_use]
    pub fn new(numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        let numerator = numerator.into();
        let denominator = denominator.into();
        Self { name: format!("{numerator}/{denominator}"), numerator, denominator }
    }
}

impl Signal for FieldRatio {
    fn evaluate(&self, instrument: &Instrument<'_>) -> Result<TimeSeries, SignalError> {
        let num = instrument.field(&self.numerator)?;
        let den = instrument.field(&self.denominator)?;
        Ok(num.zip_with(&den, |a, b| a / b).drop_non_finite())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A signal post-processed by a time-series transform.
#[derive(Debug, Clone)]
pub struct TransformedSignal<S, T> {
    signal: S,
    transform: T,
}

impl<S: Signal, T: SeriesTransform> TransformedSignal<S, T> {
    /// Wrap `signal` so its output is passed through `transform`.
    pub const fn new(signal: S, transform: T) -> Self {
        Self { signal, transform }
    }
}

impl<S: Signal, T: SeriesTransform> Signal for TransformedSignal<S, T> {
    fn evaluate(&self, instrument: &Instrument<'_>) -> Result<TimeSeries, SignalError> {
        let raw = self.signal.evaluate(instrument)?;
        Ok(self.transform.transform(&raw)?)
    }

    fn name(&self) -> &str {
        self.signal.name()
    }
}
