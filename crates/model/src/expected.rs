//! Trailing expected returns.

use ikaros_primitives::{DatedSeries, ReturnMatrix};
use ndarray::Array1;

use crate::rolling::run_windows;

/// Annualized trailing mean returns.
///
/// The value keyed at `dates[i + window]` is the mean of the `window`
/// observations strictly before it, times `annualization`.
#[must_use]
pub fn trailing_mean_returns(
    returns: &ReturnMatrix,
    window: usize,
    annualization: f64,
) -> DatedSeries<Array1<f64>> {
    run_windows("trailing_mean", returns.dates(), window, |i, _| {
        Ok(returns.window_mean(i, window) * annualization)
    })
    .into_values()
}
