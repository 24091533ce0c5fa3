//! Date-indexed series.

use std::collections::{BTreeMap, btree_map};

use ndarray::{Array1, ArrayView1, s};

use crate::{Date, PrimitivesError};

/// Containers indexed by a strictly increasing date axis.
///
/// Implemented by every container the alignment utility can restrict to a
/// common calendar.
pub trait DateIndexed {
    /// The date index, strictly increasing.
    fn dates(&self) -> &[Date];

    /// Return a copy restricted to the given dates, preserving order.
    ///
    /// `dates` must be strictly increasing; dates absent from `self` are skipped.
    #[must_use]
    fn restrict_to(&self, dates: &[Date]) -> Self
    where
        Self: Sized;
}

/// Check that a date index is strictly increasing.
///
/// # Errors
/// Returns `PrimitivesError::UnsortedDates` at the first violation.
pub fn validate_dates(dates: &[Date]) -> Result<(), PrimitivesError> {
    match dates.windows(2).find(|w| w[1] <= w[0]) {
        Some(w) => Err(PrimitivesError::UnsortedDates(w[1])),
        None => Ok(()),
    }
}

/// Positions of `wanted` dates inside `dates` (both strictly increasing).
pub(crate) fn positions_of(dates: &[Date], wanted: &[Date]) -> Vec<usize> {
    wanted.iter().filter_map(|d| dates.binary_search(d).ok()).collect()
}

/// An ordered mapping from trading date to a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<Date>,
    values: Array1<f64>,
}

impl TimeSeries {
    /// Create a new series.
    ///
    /// # Errors
    /// Returns an error if lengths differ or dates are not strictly increasing.
    pub fn new(dates: Vec<Date>, values: Array1<f64>) -> Result<Self, PrimitivesError> {
        if dates.len() != values.len() {
            return Err(PrimitivesError::LengthMismatch {
                dates: dates.len(),
                values: values.len(),
            });
        }
        validate_dates(&dates)?;
        Ok(Self { dates, values })
    }

    /// Create a series from `(date, value)` pairs in increasing date order.
    ///
    /// # Errors
    /// Returns `PrimitivesError::UnsortedDates` if the pairs are out of order.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Date, f64)>,
    ) -> Result<Self, PrimitivesError> {
        let (dates, values): (Vec<Date>, Vec<f64>) = pairs.into_iter().unzip();
        Self::new(dates, Array1::from_vec(values))
    }

    /// An empty series.
    #[must_use]
    pub fn empty() -> Self {
        Self { dates: Vec::new(), values: Array1::zeros(0) }
    }

    /// Date index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Series values.
    #[must_use]
    pub const fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Value observed at `date`, if any.
    #[must_use]
    pub fn get(&self, date: Date) -> Option<f64> {
        self.dates.binary_search(&date).ok().map(|i| self.values[i])
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// View of `len` consecutive values starting at position `start`.
    ///
    /// # Panics
    /// Panics if the window extends past the end of the series.
    #[must_use]
    pub fn window(&self, start: usize, len: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![start..start + len])
    }

    /// Apply `f` to every value.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self { dates: self.dates.clone(), values: self.values.mapv(f) }
    }

    /// Combine with another series on the dates both share.
    #[must_use]
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut dates = Vec::new();
        let mut values = Vec::new();
        for (date, a) in self.iter() {
            if let Some(b) = other.get(date) {
                dates.push(date);
                values.push(f(a, b));
            }
        }
        Self { dates, values: Array1::from_vec(values) }
    }

    /// Drop observations whose value is NaN or infinite.
    #[must_use]
    pub fn drop_non_finite(&self) -> Self {
        let (dates, values): (Vec<Date>, Vec<f64>) =
            self.iter().filter(|(_, v)| v.is_finite()).unzip();
        Self { dates, values: Array1::from_vec(values) }
    }

    /// Simple period-over-period returns `x_t / x_{t-1} - 1`.
    ///
    /// The first observation has no predecessor and is dropped.
    #[must_use]
    pub fn pct_change(&self) -> Self {
        if self.len() < 2 {
            return Self::empty();
        }
        let values: Array1<f64> =
            self.values.windows(2).into_iter().map(|w| w[1] / w[0] - 1.0).collect();
        Self { dates: self.dates[1..].to_vec(), values }
    }

    /// Re-key each value to the next date of the index (one-period lag).
    ///
    /// The value observed at `d_{t-1}` becomes the value at `d_t`; the last
    /// observation is dropped.
    #[must_use]
    pub fn lag(&self) -> Self {
        if self.len() < 2 {
            return Self::empty();
        }
        Self {
            dates: self.dates[1..].to_vec(),
            values: self.values.slice(s![..self.len() - 1]).to_owned(),
        }
    }
}

impl DateIndexed for TimeSeries {
    fn dates(&self) -> &[Date] {
        Self::dates(self)
    }

    fn restrict_to(&self, dates: &[Date]) -> Self {
        let idx = positions_of(&self.dates, dates);
        Self {
            dates: idx.iter().map(|&i| self.dates[i]).collect(),
            values: idx.iter().map(|&i| self.values[i]).collect(),
        }
    }
}

/// An ordered association from date to an immutable per-date value.
///
/// Keys are write-once: a date's entry cannot be replaced after insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries<T> {
    entries: BTreeMap<Date, T>,
}

impl<T> DatedSeries<T> {
    /// Create an empty series.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Insert the value for a date.
    ///
    /// # Errors
    /// Returns `PrimitivesError::DuplicateDate` if the date already has a value.
    pub fn insert(&mut self, date: Date, value: T) -> Result<(), PrimitivesError> {
        match self.entries.entry(date) {
            btree_map::Entry::Occupied(_) => Err(PrimitivesError::DuplicateDate(date)),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Build from `(date, value)` pairs, rejecting duplicate dates.
    ///
    /// # Errors
    /// Returns `PrimitivesError::DuplicateDate` on the first repeated date.
    pub fn from_unique(
        pairs: impl IntoIterator<Item = (Date, T)>,
    ) -> Result<Self, PrimitivesError> {
        let mut series = Self::new();
        for (date, value) in pairs {
            series.insert(date, value)?;
        }
        Ok(series)
    }

    /// Value for a date.
    #[must_use]
    pub fn get(&self, date: &Date) -> Option<&T> {
        self.entries.get(date)
    }

    /// Whether a date has a value.
    #[must_use]
    pub fn contains(&self, date: &Date) -> bool {
        self.entries.contains_key(date)
    }

    /// The entry immediately before `date`, if any.
    #[must_use]
    pub fn previous(&self, date: &Date) -> Option<(&Date, &T)> {
        self.entries.range(..*date).next_back()
    }

    /// Dates in increasing order.
    pub fn dates(&self) -> impl Iterator<Item = &Date> + '_ {
        self.entries.keys()
    }

    /// Iterate over entries in date order.
    pub fn iter(&self) -> btree_map::Iter<'_, Date, T> {
        self.entries.iter()
    }

    /// First entry.
    #[must_use]
    pub fn first(&self) -> Option<(&Date, &T)> {
        self.entries.first_key_value()
    }

    /// Last entry.
    #[must_use]
    pub fn last(&self) -> Option<(&Date, &T)> {
        self.entries.last_key_value()
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transform every value, keeping the date keys.
    #[must_use]
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> DatedSeries<U> {
        DatedSeries { entries: self.entries.iter().map(|(d, v)| (*d, f(v))).collect() }
    }
}

impl<T> From<BTreeMap<Date, T>> for DatedSeries<T> {
    fn from(entries: BTreeMap<Date, T>) -> Self {
        Self { entries }
    }
}

impl<T> Default for DatedSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for DatedSeries<T> {
    type Item = (Date, T);
    type IntoIter = btree_map::IntoIter<Date, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DatedSeries<T> {
    type Item = (&'a Date, &'a T);
    type IntoIter = btree_map::Iter<'a, Date, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl DatedSeries<f64> {
    /// Convert a scalar dated series into a `TimeSeries`.
    #[must_use]
    pub fn to_time_series(&self) -> TimeSeries {
        let (dates, values): (Vec<Date>, Vec<f64>) = self.iter().map(|(d, v)| (*d, *v)).unzip();
        TimeSeries { dates, values: Array1::from_vec(values) }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn day(d: u32) -> Date {
        Date::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn time_series_rejects_unsorted() {
        let err = TimeSeries::new(vec![day(2), day(1)], array![1.0, 2.0]).unwrap_err();
        assert_eq!(err, PrimitivesError::UnsortedDates(day(1)));

        let err = TimeSeries::new(vec![day(1), day(1)], array![1.0, 2.0]).unwrap_err();
        assert_eq!(err, PrimitivesError::UnsortedDates(day(1)));
    }

    #[test]
    fn time_series_rejects_length_mismatch() {
        let err = TimeSeries::new(vec![day(1)], array![1.0, 2.0]).unwrap_err();
        assert_eq!(err, PrimitivesError::LengthMismatch { dates: 1, values: 2 });
    }

    #[test]
    fn pct_change_drops_first() {
        let ts = TimeSeries::new(vec![day(1), day(2), day(3)], array![100.0, 110.0, 99.0]).unwrap();
        let ret = ts.pct_change();
        assert_eq!(ret.dates(), &[day(2), day(3)]);
        assert!((ret.values()[0] - 0.1).abs() < 1e-12);
        assert!((ret.values()[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn lag_shifts_values_forward() {
        let ts = TimeSeries::new(vec![day(1), day(2), day(3)], array![1.0, 2.0, 3.0]).unwrap();
        let lagged = ts.lag();
        assert_eq!(lagged.get(day(2)), Some(1.0));
        assert_eq!(lagged.get(day(3)), Some(2.0));
        assert_eq!(lagged.get(day(1)), None);
    }

    #[test]
    fn restrict_to_preserves_order() {
        let ts = TimeSeries::new(vec![day(1), day(2), day(3), day(4)], array![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let sub = ts.restrict_to(&[day(2), day(4), day(9)]);
        assert_eq!(sub.dates(), &[day(2), day(4)]);
        assert_eq!(sub.values(), &array![2.0, 4.0]);
    }

    #[test]
    fn zip_with_uses_shared_dates() {
        let a = TimeSeries::new(vec![day(1), day(2), day(3)], array![2.0, 4.0, 6.0]).unwrap();
        let b = TimeSeries::new(vec![day(2), day(3), day(4)], array![1.0, 2.0, 3.0]).unwrap();
        let ratio = a.zip_with(&b, |x, y| x / y);
        assert_eq!(ratio.dates(), &[day(2), day(3)]);
        assert_eq!(ratio.values(), &array![4.0, 3.0]);
    }

    #[test]
    fn dated_series_is_write_once() {
        let mut series = DatedSeries::new();
        series.insert(day(1), 1.0).unwrap();
        assert_eq!(series.insert(day(1), 2.0), Err(PrimitivesError::DuplicateDate(day(1))));
        assert_eq!(series.get(&day(1)), Some(&1.0));
    }

    #[test]
    fn dated_series_previous() {
        let series = DatedSeries::from_unique([(day(1), 'a'), (day(3), 'b'), (day(5), 'c')]).unwrap();
        assert_eq!(series.previous(&day(5)), Some((&day(3), &'b')));
        assert_eq!(series.previous(&day(4)), Some((&day(3), &'b')));
        assert_eq!(series.previous(&day(1)), None);
    }

    #[test]
    fn dated_series_from_map_converts_to_time_series() {
        let map = BTreeMap::from([(day(4), 0.5), (day(2), -1.0)]);
        let ts = DatedSeries::from(map).to_time_series();
        assert_eq!(ts.dates(), &[day(2), day(4)]);
        assert_eq!(ts.values(), &array![-1.0, 0.5]);
    }
}
