//! Return matrix definitions.

use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{
    Date, DateIndexed, InstrumentId, PrimitivesError, TimeSeries,
    series::{positions_of, validate_dates},
};

/// Date-indexed per-instrument returns (rows = dates, columns = instruments).
///
/// Column order is the canonical instrument ordering for every matrix derived
/// from this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<Date>,
    instruments: Vec<InstrumentId>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Create a new return matrix.
    ///
    /// # Errors
    /// Returns an error if dates are unsorted, instruments repeat, or the
    /// value shape does not match `(dates, instruments)`.
    pub fn new(
        dates: Vec<Date>,
        instruments: Vec<InstrumentId>,
        values: Array2<f64>,
    ) -> Result<Self, PrimitivesError> {
        validate_dates(&dates)?;
        validate_instruments(&instruments)?;
        if values.dim() != (dates.len(), instruments.len()) {
            return Err(PrimitivesError::ShapeMismatch {
                expected_rows: dates.len(),
                expected_cols: instruments.len(),
                rows: values.nrows(),
                cols: values.ncols(),
            });
        }
        Ok(Self { dates, instruments, values })
    }

    /// Assemble a matrix from per-instrument series that share one date index.
    ///
    /// # Errors
    /// Returns `PrimitivesError::Misaligned` if the series have different dates.
    pub fn from_aligned_columns(
        columns: Vec<(InstrumentId, TimeSeries)>,
    ) -> Result<Self, PrimitivesError> {
        let Some((_, first)) = columns.first() else {
            return Ok(Self {
                dates: Vec::new(),
                instruments: Vec::new(),
                values: Array2::zeros((0, 0)),
            });
        };
        let dates = first.dates().to_vec();
        let mut values = Array2::zeros((dates.len(), columns.len()));
        let mut instruments = Vec::with_capacity(columns.len());
        for (j, (id, series)) in columns.into_iter().enumerate() {
            if series.dates() != dates.as_slice() {
                return Err(PrimitivesError::Misaligned);
            }
            values.column_mut(j).assign(series.values());
            instruments.push(id);
        }
        Self::new(dates, instruments, values)
    }

    /// Simple returns from a price matrix with the same layout.
    ///
    /// The first row has no predecessor and is dropped, as is any row with a
    /// non-finite return (missing or zero prices).
    ///
    /// # Errors
    /// Returns an error if the price matrix itself is malformed.
    pub fn from_prices(
        dates: Vec<Date>,
        instruments: Vec<InstrumentId>,
        prices: Array2<f64>,
    ) -> Result<Self, PrimitivesError> {
        let prices = Self::new(dates, instruments, prices)?;
        let mut out_dates = Vec::new();
        let mut rows = Vec::new();
        for t in 1..prices.n_dates() {
            let prev = prices.values.row(t - 1);
            let cur = prices.values.row(t);
            let ret: Array1<f64> = cur.iter().zip(prev.iter()).map(|(c, p)| c / p - 1.0).collect();
            if ret.iter().all(|r| r.is_finite()) {
                out_dates.push(prices.dates[t]);
                rows.extend(ret);
            }
        }
        let values = Array2::from_shape_vec((out_dates.len(), prices.n_instruments()), rows)
            .map_err(|_| PrimitivesError::Misaligned)?;
        Self::new(out_dates, prices.instruments, values)
    }

    /// Date index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Instrument ordering.
    #[must_use]
    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    /// Return values (n_dates x n_instruments).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    #[must_use]
    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of instruments.
    #[must_use]
    pub fn n_instruments(&self) -> usize {
        self.instruments.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.instruments.is_empty()
    }

    /// Column position of an instrument.
    #[must_use]
    pub fn instrument_index(&self, id: &InstrumentId) -> Option<usize> {
        self.instruments.iter().position(|i| i == id)
    }

    /// Row of returns at a date.
    #[must_use]
    pub fn row_at(&self, date: Date) -> Option<ArrayView1<'_, f64>> {
        self.dates.binary_search(&date).ok().map(|i| self.values.row(i))
    }

    /// One instrument's returns as a series.
    #[must_use]
    pub fn column(&self, j: usize) -> TimeSeries {
        TimeSeries::new(self.dates.clone(), self.values.column(j).to_owned())
            .unwrap_or_else(|_| TimeSeries::empty())
    }

    /// `len` consecutive rows starting at position `start`.
    ///
    /// # Panics
    /// Panics if the window extends past the last row.
    #[must_use]
    pub fn window(&self, start: usize, len: usize) -> ArrayView2<'_, f64> {
        self.values.slice(s![start..start + len, ..])
    }

    /// Column means over a window of rows.
    #[must_use]
    pub fn window_mean(&self, start: usize, len: usize) -> Array1<f64> {
        self.window(start, len)
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.n_instruments()))
    }
}

impl DateIndexed for ReturnMatrix {
    fn dates(&self) -> &[Date] {
        Self::dates(self)
    }

    fn restrict_to(&self, dates: &[Date]) -> Self {
        let idx = positions_of(&self.dates, dates);
        Self {
            dates: idx.iter().map(|&i| self.dates[i]).collect(),
            instruments: self.instruments.clone(),
            values: self.values.select(Axis(0), &idx),
        }
    }
}

fn validate_instruments(instruments: &[InstrumentId]) -> Result<(), PrimitivesError> {
    let mut seen = HashSet::with_capacity(instruments.len());
    for id in instruments {
        if !seen.insert(id) {
            return Err(PrimitivesError::DuplicateInstrument(id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;
    use crate::instrument_ids;

    fn day(d: u32) -> Date {
        Date::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn rejects_duplicate_instruments() {
        let err = ReturnMatrix::new(
            vec![day(1)],
            instrument_ids(["A", "A"]),
            array![[0.1, 0.2]],
        )
        .unwrap_err();
        assert_eq!(err, PrimitivesError::DuplicateInstrument(InstrumentId::new("A")));
    }

    #[test]
    fn rejects_wrong_shape() {
        let err =
            ReturnMatrix::new(vec![day(1), day(2)], instrument_ids(["A"]), array![[0.1, 0.2]])
                .unwrap_err();
        assert!(matches!(err, PrimitivesError::ShapeMismatch { .. }));
    }

    #[test]
    fn from_prices_computes_simple_returns() {
        let prices = array![[100.0, 50.0], [110.0, 55.0], [121.0, 44.0]];
        let m = ReturnMatrix::from_prices(
            vec![day(1), day(2), day(3)],
            instrument_ids(["A", "B"]),
            prices,
        )
        .unwrap();

        assert_eq!(m.dates(), &[day(2), day(3)]);
        assert_relative_eq!(m.values()[[0, 0]], 0.1, epsilon = 1e-12);
        assert_relative_eq!(m.values()[[1, 1]], -0.2, epsilon = 1e-12);
    }

    #[test]
    fn from_aligned_columns_requires_same_index() {
        let a = TimeSeries::new(vec![day(1), day(2)], array![0.1, 0.2]).unwrap();
        let b = TimeSeries::new(vec![day(1), day(3)], array![0.1, 0.2]).unwrap();
        let err = ReturnMatrix::from_aligned_columns(vec![("A".into(), a.clone()), ("B".into(), b)])
            .unwrap_err();
        assert_eq!(err, PrimitivesError::Misaligned);

        let m = ReturnMatrix::from_aligned_columns(vec![("A".into(), a.clone()), ("B".into(), a)])
            .unwrap();
        assert_eq!(m.n_instruments(), 2);
        assert_eq!(m.column(1).get(day(2)), Some(0.2));
    }

    #[test]
    fn restrict_keeps_column_order() {
        let m = ReturnMatrix::new(
            vec![day(1), day(2), day(3)],
            instrument_ids(["Z", "A"]),
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
        )
        .unwrap();
        let sub = m.restrict_to(&[day(1), day(3)]);
        assert_eq!(sub.instruments()[0].as_str(), "Z");
        assert_eq!(sub.values(), &array![[1.0, 2.0], [5.0, 6.0]]);
    }
}
