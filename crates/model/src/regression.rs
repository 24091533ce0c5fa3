//! Rolling multi-regressor OLS.

use ikaros_math::{MathError, OlsResult, regress};
use ikaros_primitives::{Date, DateIndexed, RollingEstimate, TimeSeries};
use ndarray::{Array1, Array2, Axis};

use crate::{ModelError, common_dates, rolling::run_windows};

/// Rolling regression results, one OLS fit per window-end date.
#[derive(Debug, Clone)]
pub struct RollingRegression {
    regressors: Vec<String>,
    results: RollingEstimate<OlsResult, ModelError>,
}

impl RollingRegression {
    /// Default window length.
    pub const DEFAULT_WINDOW: usize = 42;

    /// Regressor names in coefficient order; the intercept follows them.
    #[must_use]
    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    /// Per-date fits and failures.
    #[must_use]
    pub const fn results(&self) -> &RollingEstimate<OlsResult, ModelError> {
        &self.results
    }

    /// Time series of one regressor's coefficient.
    #[must_use]
    pub fn coefficient(&self, name: &str) -> Option<TimeSeries> {
        let j = self.regressors.iter().position(|r| r == name)?;
        Some(self.results.values().map(|fit| fit.coefficients[j]).to_time_series())
    }

    /// Time series of the intercept.
    #[must_use]
    pub fn intercept(&self) -> TimeSeries {
        self.results.values().map(|fit| fit.intercept().unwrap_or(f64::NAN)).to_time_series()
    }
}

/// Regress `response` on named regressors plus an intercept over every
/// sliding window.
///
/// Inputs are aligned on their common dates and dates with a non-finite value
/// in any input are dropped. Window `[i, i + window)` is keyed by the date that
/// follows it.
///
/// # Errors
/// Returns `ModelError::EmptyIntersection` if the inputs share no dates and
/// `ModelError::InvalidConfig` if the window cannot hold more observations
/// than coefficients.
pub fn rolling_regression(
    response: &TimeSeries,
    regressors: &[(String, TimeSeries)],
    window: usize,
) -> Result<RollingRegression, ModelError> {
    let k = regressors.len() + 1;
    if window <= k {
        return Err(ModelError::InvalidConfig(format!(
            "window of {window} cannot fit {k} coefficients"
        )));
    }

    let mut inputs: Vec<&dyn DateIndexed> = vec![response];
    inputs.extend(regressors.iter().map(|(_, s)| s as &dyn DateIndexed));
    let shared = common_dates(&inputs)?;

    let y_all = response.restrict_to(&shared);
    let x_all: Vec<TimeSeries> = regressors.iter().map(|(_, s)| s.restrict_to(&shared)).collect();
    let keep: Vec<usize> = (0..shared.len())
        .filter(|&t| {
            y_all.values()[t].is_finite() && x_all.iter().all(|x| x.values()[t].is_finite())
        })
        .collect();

    let dates: Vec<Date> = keep.iter().map(|&t| shared[t]).collect();
    let y: Array1<f64> = keep.iter().map(|&t| y_all.values()[t]).collect();
    let x = Array2::from_shape_fn((keep.len(), regressors.len()), |(r, j)| {
        x_all[j].values()[keep[r]]
    });

    let results = run_windows("rolling_regression", &dates, window, |i, date| {
        let range = i..i + window;
        regress(
            x.slice_axis(Axis(0), range.clone().into()),
            y.slice_axis(Axis(0), range.into()),
            true,
        )
        .map_err(|e| match e {
            MathError::SingularMatrix => ModelError::SingularDesign { date },
            other => ModelError::Math(other),
        })
    });

    Ok(RollingRegression {
        regressors: regressors.iter().map(|(name, _)| name.clone()).collect(),
        results,
    })
}
