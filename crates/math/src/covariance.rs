//! Sample covariance and diagonal shrinkage.

use ndarray::{Array2, ArrayView2, Axis};

use crate::MathError;

/// Sample covariance (denominator `n - 1`) of the columns of `window`.
///
/// Rows are observations, columns are variables. The result is exactly
/// symmetric.
///
/// # Errors
/// Returns `MathError::InsufficientData` with fewer than two rows and
/// `MathError::EmptyData` with no columns.
pub fn sample_covariance(window: ArrayView2<'_, f64>) -> Result<Array2<f64>, MathError> {
    let (n, p) = window.dim();
    if p == 0 {
        return Err(MathError::EmptyData);
    }
    if n < 2 {
        return Err(MathError::InsufficientData { required: 2, actual: n });
    }

    let means = window.mean_axis(Axis(0)).ok_or(MathError::EmptyData)?;
    let centered = &window - &means;
    let denom = (n - 1) as f64;

    let mut cov = Array2::zeros((p, p));
    for i in 0..p {
        let ci = centered.column(i);
        for j in i..p {
            let v = ci.dot(&centered.column(j)) / denom;
            cov[[i, j]] = v;
            cov[[j, i]] = v;
        }
    }
    Ok(cov)
}

/// Blend a covariance matrix toward its own diagonal.
///
/// Returns `shrinkage * cov + (1 - shrinkage) * diag(diag(cov))`: variances
/// are unchanged and every covariance is scaled by `shrinkage`. At 1 this is
/// `cov` itself, at 0 the off-diagonal entries are exactly zero.
///
/// # Errors
/// Returns `MathError::InvalidParameter` if `shrinkage` is outside `[0, 1]`,
/// and `MathError::DimensionMismatch` for a non-square input.
pub fn shrink_to_diagonal(cov: &Array2<f64>, shrinkage: f64) -> Result<Array2<f64>, MathError> {
    if !(0.0..=1.0).contains(&shrinkage) {
        return Err(MathError::InvalidParameter(format!(
            "shrinkage must be in [0, 1], got {shrinkage}"
        )));
    }
    if cov.nrows() != cov.ncols() {
        return Err(MathError::DimensionMismatch { expected: cov.nrows(), actual: cov.ncols() });
    }

    let mut out = cov.clone();
    for ((i, j), v) in out.indexed_iter_mut() {
        if i != j {
            *v = if shrinkage == 0.0 { 0.0 } else { shrinkage * *v };
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    #[test]
    fn matches_hand_computed_covariance() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 5.0], [4.0, 9.0]];
        let cov = sample_covariance(data.view()).unwrap();

        // var(x) = 5/3, var(y) = 26/3, cov = 11/3
        assert_abs_diff_eq!(cov[[0, 0]], 5.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[1, 1]], 26.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov[[0, 1]], 11.0 / 3.0, epsilon = 1e-12);
        assert_eq!(cov[[0, 1]], cov[[1, 0]]);
    }

    #[test]
    fn single_row_is_insufficient() {
        let data = array![[1.0, 2.0]];
        assert_eq!(
            sample_covariance(data.view()).unwrap_err(),
            MathError::InsufficientData { required: 2, actual: 1 }
        );
    }

    #[test]
    fn full_shrinkage_is_identity_map() {
        let cov = array![[0.04, 0.01], [0.01, 0.09]];
        assert_eq!(shrink_to_diagonal(&cov, 1.0).unwrap(), cov);
    }

    #[test]
    fn zero_shrinkage_is_diagonal() {
        let cov = array![[0.04, -0.01, 0.02], [-0.01, 0.09, 0.0], [0.02, 0.0, 0.01]];
        let out = shrink_to_diagonal(&cov, 0.0).unwrap();
        assert_eq!(out, Array2::from_diag(&cov.diag()));
    }

    #[test]
    fn partial_shrinkage_scales_off_diagonal() {
        let cov = array![[0.04, 0.01], [0.01, 0.09]];
        let out = shrink_to_diagonal(&cov, 0.8).unwrap();
        assert_abs_diff_eq!(out[[0, 1]], 0.008, epsilon = 1e-15);
        assert_eq!(out[[1, 1]], 0.09);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn invalid_shrinkage(#[case] s: f64) {
        let cov = array![[1.0]];
        assert!(matches!(shrink_to_diagonal(&cov, s), Err(MathError::InvalidParameter(_))));
    }
}
