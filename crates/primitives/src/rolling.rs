//! Per-date rolling estimate container.

use std::collections::BTreeMap;

use crate::{Date, DatedSeries};

/// Results of a rolling computation with per-date failure isolation.
///
/// A failing window is recorded under `failures` and never aborts the run;
/// callers pick a policy with [`RollingEstimate::values`] (skip gaps) or
/// [`RollingEstimate::into_strict`] (fail fast).
#[derive(Debug, Clone)]
pub struct RollingEstimate<T, E> {
    values: DatedSeries<T>,
    failures: DatedSeries<E>,
}

impl<T, E> RollingEstimate<T, E> {
    /// Create an empty estimate.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: DatedSeries::new(), failures: DatedSeries::new() }
    }

    /// Merge per-date outcomes into one estimate.
    ///
    /// A repeated date keeps its first outcome.
    #[must_use]
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = (Date, Result<T, E>)>) -> Self {
        let mut merged = BTreeMap::new();
        for (date, outcome) in outcomes {
            merged.entry(date).or_insert(outcome);
        }
        let mut values = BTreeMap::new();
        let mut failures = BTreeMap::new();
        for (date, outcome) in merged {
            match outcome {
                Ok(value) => {
                    values.insert(date, value);
                }
                Err(err) => {
                    failures.insert(date, err);
                }
            }
        }
        Self { values: values.into(), failures: failures.into() }
    }

    /// Successfully estimated dates.
    #[must_use]
    pub const fn values(&self) -> &DatedSeries<T> {
        &self.values
    }

    /// Dates whose window failed, with the failure.
    #[must_use]
    pub const fn failures(&self) -> &DatedSeries<E> {
        &self.failures
    }

    /// Whether a date has either a value or a failure.
    #[must_use]
    pub fn contains(&self, date: &Date) -> bool {
        self.values.contains(date) || self.failures.contains(date)
    }

    /// Whether every date succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of dates attempted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() + self.failures.len()
    }

    /// Check if no date was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.failures.is_empty()
    }

    /// Drop the failures and keep the partial series.
    #[must_use]
    pub fn into_values(self) -> DatedSeries<T> {
        self.values
    }

    /// Fail fast: the earliest failure, or the complete series.
    ///
    /// # Errors
    /// Returns the failure of the earliest failing date.
    pub fn into_strict(self) -> Result<DatedSeries<T>, E> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.values),
        }
    }
}

impl<T, E> Default for RollingEstimate<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
