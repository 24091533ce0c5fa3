//! Closed-form ordinary least squares.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{MathError, invert_symmetric};

/// Result of an ordinary least squares regression.
///
/// When an intercept was requested it is the last coefficient.
#[derive(Debug, Clone)]
pub struct OlsResult {
    /// Estimated coefficients, regressors first, intercept last.
    pub coefficients: Array1<f64>,
    /// Fitted values.
    pub fitted: Array1<f64>,
    /// Residuals.
    pub residuals: Array1<f64>,
    /// Residual variance `sum(e^2) / (n - k)`.
    pub residual_variance: f64,
    /// Coefficient covariance `residual_variance * (X'X)^-1`.
    pub coefficient_covariance: Array2<f64>,
    /// Coefficient standard errors.
    pub standard_errors: Array1<f64>,
    /// Coefficient t-statistics. Infinite when the fit is exact.
    pub t_statistics: Array1<f64>,
    /// R-squared.
    pub r_squared: f64,
    /// Whether the last coefficient is an intercept.
    pub has_intercept: bool,
}

impl OlsResult {
    /// Slope coefficients, excluding the intercept.
    #[must_use]
    pub fn slopes(&self) -> ArrayView1<'_, f64> {
        let k = self.coefficients.len() - usize::from(self.has_intercept);
        self.coefficients.slice(s![..k])
    }

    /// Intercept, if one was fitted.
    #[must_use]
    pub fn intercept(&self) -> Option<f64> {
        if self.has_intercept { self.coefficients.last().copied() } else { None }
    }

    /// Number of observations.
    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.residuals.len()
    }
}

/// Regress `y` on the columns of `x`.
///
/// With `add_constant`, a column of ones is appended after the regressors.
///
/// # Errors
/// Returns `MathError::Underdetermined` unless there are more observations
/// than regressors, and `MathError::SingularMatrix` when `X'X` is not
/// invertible (collinear regressors or a constant regressor next to the
/// intercept).
pub fn regress(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    add_constant: bool,
) -> Result<OlsResult, MathError> {
    let n = y.len();
    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    let k = x.ncols() + usize::from(add_constant);
    if k == 0 {
        return Err(MathError::EmptyData);
    }
    if n <= k {
        return Err(MathError::Underdetermined { observations: n, regressors: k });
    }

    let design = if add_constant {
        let mut d = Array2::ones((n, k));
        d.slice_mut(s![.., ..k - 1]).assign(&x);
        d
    } else {
        x.to_owned()
    };

    // Columns are scaled to unit norm so regressors with large levels keep
    // a well-conditioned X'X; coefficients are unscaled afterwards.
    let norms = design.map_axis(Axis(0), |col| col.dot(&col).sqrt());
    if norms.iter().any(|v| *v == 0.0) {
        return Err(MathError::SingularMatrix);
    }
    let scaled = &design / &norms;
    let scaled_inv = invert_symmetric(&scaled.t().dot(&scaled))?;
    let coefficients = scaled_inv.dot(&scaled.t().dot(&y)) / &norms;
    let outer = norms.view().insert_axis(Axis(1)).dot(&norms.view().insert_axis(Axis(0)));
    let xtx_inv = scaled_inv / &outer;

    let fitted = design.dot(&coefficients);
    let residuals = &y - &fitted;
    let ss_res: f64 = residuals.iter().map(|e| e * e).sum();
    let residual_variance = ss_res / (n - k) as f64;

    let coefficient_covariance = &xtx_inv * residual_variance;
    let standard_errors = coefficient_covariance.diag().mapv(|v| v.max(0.0).sqrt());
    let t_statistics = &coefficients / &standard_errors;

    let y_mean = y.mean().unwrap_or(0.0);
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(OlsResult {
        coefficients,
        fitted,
        residuals,
        residual_variance,
        coefficient_covariance,
        standard_errors,
        t_statistics,
        r_squared,
        has_intercept: add_constant,
    })
}
