//! Conversions between Polars frames and ikaros containers.
//!
//! Input tables are wide: a `date` column plus one numeric column per
//! instrument (or per benchmark series). Dates may be a Polars `Date` column
//! or `YYYY-MM-DD` strings; rows may come in any order.

use ikaros_primitives::{
    CovarianceSeries, Date, InstrumentId, ReturnMatrix, TimeSeries, instrument_ids,
};
use ikaros_traits::BenchmarkSeries;
use ndarray::{Array1, Array2, ArrayView1};
use polars::prelude::*;
use tracing::debug;

use crate::UtilsError;

/// Name of the date column in every table.
pub const DATE_COLUMN: &str = "date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days from 0001-01-01 to the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, UtilsError> {
    df.column(name).map_err(|_| UtilsError::MissingColumn(name.to_string()))
}

/// Parse a date column.
///
/// # Errors
/// Returns `UtilsError::InvalidParameter` for a null or malformed date or an
/// unsupported column type.
pub fn dates_from_column(column: &Column) -> Result<Vec<Date>, UtilsError> {
    match column.dtype() {
        DataType::Date => {
            let days = column.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|d| {
                    d.and_then(|d| Date::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                        .ok_or_else(|| UtilsError::InvalidParameter("null date".to_string()))
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .map(|s| {
                let s = s.ok_or_else(|| UtilsError::InvalidParameter("null date".to_string()))?;
                Date::parse_from_str(s, DATE_FORMAT)
                    .map_err(|e| UtilsError::InvalidParameter(format!("date {s:?}: {e}")))
            })
            .collect(),
        other => Err(UtilsError::InvalidParameter(format!(
            "column {} has type {other}, expected a date",
            column.name()
        ))),
    }
}

fn float_values(column: &Column) -> Result<Vec<f64>, UtilsError> {
    let floats = column.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Dates in increasing order and the row each came from.
fn sorted_dates(df: &DataFrame) -> Result<(Vec<Date>, Vec<usize>), UtilsError> {
    let dates = dates_from_column(column(df, DATE_COLUMN)?)?;
    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);
    Ok((order.iter().map(|&i| dates[i]).collect(), order))
}

fn sorted_values(df: &DataFrame, name: &str, order: &[usize]) -> Result<Array1<f64>, UtilsError> {
    let raw = float_values(column(df, name)?)?;
    Ok(order.iter().map(|&i| raw[i]).collect())
}

/// Read a wide table into a date by instrument panel.
///
/// Every column other than `date` is an instrument. Nulls become NaN.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` without a `date` column and
/// `UtilsError::Primitives` if a date repeats.
pub fn frame_to_panel(df: &DataFrame) -> Result<ReturnMatrix, UtilsError> {
    let (dates, order) = sorted_dates(df)?;
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATE_COLUMN)
        .map(|name| name.to_string())
        .collect();

    let mut values = Array2::from_elem((dates.len(), names.len()), f64::NAN);
    for (j, name) in names.iter().enumerate() {
        values.column_mut(j).assign(&sorted_values(df, name, &order)?);
    }
    debug!(dates = dates.len(), instruments = names.len(), "panel loaded");
    Ok(ReturnMatrix::new(dates, instrument_ids(names), values)?)
}

/// Read one column as a series, dropping missing values.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if either column is absent and
/// `UtilsError::Primitives` if a date repeats.
pub fn frame_to_series(df: &DataFrame, name: &str) -> Result<TimeSeries, UtilsError> {
    let (dates, order) = sorted_dates(df)?;
    let values = sorted_values(df, name, &order)?;
    Ok(TimeSeries::new(dates, values)?.drop_non_finite())
}

/// Read a benchmark table with `excess`, `total` and `risk_free` columns.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if a column is absent.
pub fn benchmark_from_frame(df: &DataFrame) -> Result<BenchmarkSeries, UtilsError> {
    Ok(BenchmarkSeries {
        excess: frame_to_series(df, "excess")?,
        total: frame_to_series(df, "total")?,
        risk_free: frame_to_series(df, "risk_free")?,
    })
}

fn date_column(dates: impl IntoIterator<Item = Date>) -> Column {
    let formatted: Vec<String> =
        dates.into_iter().map(|d| d.format(DATE_FORMAT).to_string()).collect();
    Column::new(DATE_COLUMN.into(), formatted)
}

/// Write per-date vectors as a wide table, one column per instrument.
///
/// # Errors
/// Returns `UtilsError::InvalidParameter` if a vector does not have one
/// entry per instrument.
pub fn vectors_to_frame<'a>(
    instruments: &[InstrumentId],
    rows: impl IntoIterator<Item = (Date, ArrayView1<'a, f64>)>,
) -> Result<DataFrame, UtilsError> {
    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); instruments.len()];
    for (date, row) in rows {
        if row.len() != instruments.len() {
            return Err(UtilsError::InvalidParameter(format!(
                "{date}: {} values for {} instruments",
                row.len(),
                instruments.len()
            )));
        }
        dates.push(date);
        for (column, value) in columns.iter_mut().zip(row.iter()) {
            column.push(*value);
        }
    }

    let mut out = vec![date_column(dates)];
    out.extend(
        instruments
            .iter()
            .zip(columns)
            .map(|(id, values)| Column::new(id.as_str().into(), values)),
    );
    Ok(DataFrame::new(out)?)
}

/// Write a covariance series in long format: `date, row, column, value`.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be assembled.
pub fn covariance_to_frame(series: &CovarianceSeries) -> Result<DataFrame, UtilsError> {
    let instruments = series.instruments();
    let mut dates = Vec::new();
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    for (date, matrix) in series.matrices() {
        for ((i, j), value) in matrix.matrix().indexed_iter() {
            dates.push(*date);
            rows.push(instruments[i].to_string());
            cols.push(instruments[j].to_string());
            values.push(*value);
        }
    }
    Ok(DataFrame::new(vec![
        date_column(dates),
        Column::new("row".into(), rows),
        Column::new("column".into(), cols),
        Column::new("value".into(), values),
    ])?)
}

/// Write a single series as a two-column table.
///
/// # Errors
/// Returns `UtilsError::Polars` if the frame cannot be assembled.
pub fn series_to_frame(series: &TimeSeries, name: &str) -> Result<DataFrame, UtilsError> {
    Ok(DataFrame::new(vec![
        date_column(series.dates().iter().copied()),
        Column::new(name.into(), series.values().to_vec()),
    ])?)
}
