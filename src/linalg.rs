//! Pseudo-inverse and shape-checked products.
//!
//! `pinv` matches `numpy.linalg.pinv(a, rcond=1e-15)`: SVD, then singular
//! values `<= rcond · σ_max` are treated as zero. The SVD itself runs in
//! nalgebra; matrices cross the boundary element-wise, so the two crates do
//! not need to agree on an ndarray version.
use nalgebra::{DMatrix, SVD};
use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// numpy's default `rcond`.
pub const DEFAULT_RCOND: f64 = 1e-15;

const SVD_MAX_ITER: usize = 10_000;

/// Moore–Penrose pseudo-inverse of `a` ([M, N] → [N, M]).
///
/// A matrix containing NaN or ±inf yields an all-NaN result instead of an
/// error, so degenerate inputs propagate as NaN through the pipeline.
pub fn pinv(a: ArrayView2<f64>, rcond: f64) -> Result<Array2<f64>> {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return Ok(Array2::zeros((cols, rows)));
    }
    if a.iter().any(|v| !v.is_finite()) {
        tracing::warn!(rows, cols, "pinv input has non-finite entries; result is NaN");
        return Ok(Array2::from_elem((cols, rows), f64::NAN));
    }

    let m = to_dmatrix(a);
    let svd = SVD::try_new(m, true, true, f64::EPSILON, SVD_MAX_ITER)
        .ok_or(Error::SvdNoConvergence { rows, cols })?;
    let s_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let cutoff = rcond * s_max;
    let inv = svd.pseudo_inverse(cutoff).map_err(Error::PseudoInverse)?;
    Ok(from_dmatrix(&inv))
}

/// `a · b` with an explicit inner-dimension check instead of a panic.
pub fn matmul(a: ArrayView2<f64>, b: ArrayView2<f64>, op: &'static str) -> Result<Array2<f64>> {
    if a.ncols() != b.nrows() {
        return Err(Error::shape(op, &[a.ncols()], &[b.nrows()]));
    }
    Ok(a.dot(&b))
}

fn to_dmatrix(a: ArrayView2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}
