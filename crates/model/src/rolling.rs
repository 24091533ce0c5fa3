//! Parallel dispatch of independent windows.

use ikaros_primitives::{Date, RollingEstimate};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::ModelError;

/// Run `estimate` for every full window of `window` observations over `dates`.
///
/// Window `i` covers positions `[i, i + window)` and is keyed by `dates[i + window]`,
/// the first date after the window. With too few observations nothing is
/// estimated and the omission is only logged.
pub(crate) fn run_windows<T, F>(
    estimator: &'static str,
    dates: &[Date],
    window: usize,
    estimate: F,
) -> RollingEstimate<T, ModelError>
where
    T: Send,
    F: Fn(usize, Date) -> Result<T, ModelError> + Sync,
{
    let n_windows = dates.len().saturating_sub(window);
    if n_windows == 0 {
        let skipped = ModelError::InsufficientWindow { required: window + 1, actual: dates.len() };
        debug!(estimator, %skipped, "no complete window");
        return RollingEstimate::new();
    }

    let outcomes: Vec<(Date, Result<T, ModelError>)> = (0..n_windows)
        .into_par_iter()
        .map(|i| {
            let date = dates[i + window];
            (date, estimate(i, date))
        })
        .collect();

    let result = RollingEstimate::from_outcomes(outcomes);
    for (date, error) in result.failures() {
        warn!(estimator, %date, %error, "window estimate failed");
    }
    info!(
        estimator,
        windows = n_windows,
        failed = result.failures().len(),
        first = ?result.values().first().map(|(d, _)| *d),
        last = ?result.values().last().map(|(d, _)| *d),
        "rolling estimate complete"
    );
    result
}
