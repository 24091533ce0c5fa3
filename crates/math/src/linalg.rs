//! Dense linear algebra on small, possibly ill-conditioned matrices.
//!
//! All routines work on a private copy, so one matrix can be shared by
//! concurrent readers.

use ndarray::{Array1, Array2, Axis};

use crate::MathError;

/// A pivot smaller than this, after each row is scaled to unit max-norm,
/// counts as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

fn check_square(a: &Array2<f64>) -> Result<usize, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }
    Ok(n)
}

/// Reciprocal of the largest absolute entry in each row.
///
/// Pivots are compared on the equilibrated rows, so a badly scaled but
/// regular matrix such as `diag(1, 1e-13)` is not mistaken for singular.
fn row_scales(a: &Array2<f64>) -> Result<Array1<f64>, MathError> {
    let mut scales = Array1::zeros(a.nrows());
    for (i, row) in a.rows().into_iter().enumerate() {
        let max = row.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if !max.is_finite() {
            return Err(MathError::InvalidParameter(
                "matrix contains non-finite values".to_string(),
            ));
        }
        if max == 0.0 {
            return Err(MathError::SingularMatrix);
        }
        scales[i] = max.recip();
    }
    Ok(scales)
}

/// Row of the largest absolute entry in `col`, at or below the diagonal.
fn find_pivot(m: &Array2<f64>, col: usize) -> (usize, f64) {
    let mut best = (col, m[[col, col]].abs());
    for row in (col + 1)..m.nrows() {
        let v = m[[row, col]].abs();
        if v > best.1 {
            best = (row, v);
        }
    }
    best
}

fn swap_rows(m: &mut Array2<f64>, a: usize, b: usize) {
    if a == b {
        return;
    }
    for j in 0..m.ncols() {
        m.swap([a, j], [b, j]);
    }
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
/// Returns `MathError::SingularMatrix` if a pivot vanishes relative to its
/// row scale, and a dimension error if `a` is empty or not square.
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = check_square(a)?;
    let scales = row_scales(a)?;

    // Augmented [DA | D] with D = diag(scales), which reduces to [I | A^-1].
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]] * scales[i];
        }
        aug[[i, n + i]] = scales[i];
    }

    for col in 0..n {
        let (pivot_row, pivot_abs) = find_pivot(&aug, col);
        if pivot_abs < PIVOT_TOLERANCE {
            return Err(MathError::SingularMatrix);
        }
        swap_rows(&mut aug, col, pivot_row);

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..2 * n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    Ok(aug.slice_axis(Axis(1), (n..2 * n).into()).to_owned())
}

/// Invert a symmetric matrix and symmetrize the result.
///
/// Elimination leaves rounding asymmetries of order machine epsilon; the
/// average of the inverse and its transpose removes them.
///
/// # Errors
/// Same as [`invert`].
pub fn invert_symmetric(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let inv = invert(a)?;
    Ok((&inv + &inv.t()) * 0.5)
}

/// Solve `A x = b` using Gaussian elimination with partial pivoting.
///
/// # Errors
/// Returns `MathError::SingularMatrix` for a singular system and a dimension
/// error if the shapes disagree.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = check_square(a)?;
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }
    let scales = row_scales(a)?;

    // Augmented matrix [DA | Db]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]] * scales[i];
        }
        aug[[i, n]] = b[i] * scales[i];
    }

    for col in 0..n {
        let (pivot_row, pivot_abs) = find_pivot(&aug, col);
        if pivot_abs < PIVOT_TOLERANCE {
            return Err(MathError::SingularMatrix);
        }
        swap_rows(&mut aug, col, pivot_row);

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}
