//! Window statistics.

use ndarray::{Array1, ArrayView1, s};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::MathError;

/// Arithmetic mean.
///
/// # Errors
/// Returns `MathError::EmptyData` for an empty input.
pub fn mean(values: ArrayView1<'_, f64>) -> Result<f64, MathError> {
    values.mean().ok_or(MathError::EmptyData)
}

/// Sample variance with denominator `n - 1`.
///
/// # Errors
/// Returns `MathError::InsufficientData` with fewer than two observations.
pub fn sample_variance(values: ArrayView1<'_, f64>) -> Result<f64, MathError> {
    let n = values.len();
    if n < 2 {
        return Err(MathError::InsufficientData { required: 2, actual: n });
    }
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64)
}

/// Trailing z-score over a window that ends at the current observation.
///
/// For `t >= window - 1` the output is
/// `(x_t - mean(x_{t-window+1..t})) / std(x_{t-window+1..t})`, the statistics
/// taken over the `window - 1` observations before `t` (sample standard
/// deviation). Earlier positions, and windows with zero dispersion, are NaN.
///
/// # Errors
/// Returns `MathError::InvalidParameter` if `window < 3`.
pub fn trailing_zscore(
    values: ArrayView1<'_, f64>,
    window: usize,
) -> Result<Array1<f64>, MathError> {
    if window < 3 {
        return Err(MathError::InvalidParameter(format!(
            "z-score window must be at least 3, got {window}"
        )));
    }
    let mut out = Array1::from_elem(values.len(), f64::NAN);
    for t in (window - 1)..values.len() {
        let history = values.slice(s![t + 1 - window..t]);
        let m = mean(history)?;
        let sd = sample_variance(history)?.sqrt();
        if sd > 0.0 {
            out[t] = (values[t] - m) / sd;
        }
    }
    Ok(out)
}

/// Standard normal cumulative distribution function.
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}
