//! Head-motion nuisance regression.
//!
//! `m = Y − regs · (pinv(regs) · Y)`: the least-squares fit of the nuisance
//! regressors is removed from every ROI column independently.
use ndarray::{s, Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::linalg::{matmul, pinv};

/// Regress `regs` ([T, K]) out of `y` ([T, R]).
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `regs` and `y` disagree on the number of time
/// points.
pub fn regress_head_motion(
    y: ArrayView2<f64>,
    regs: ArrayView2<f64>,
    rcond: f64,
) -> Result<Array2<f64>> {
    if regs.nrows() != y.nrows() {
        return Err(Error::shape("regress_head_motion", &[y.nrows()], &[regs.nrows()]));
    }
    let p = pinv(regs, rcond)?;
    let b = matmul(p.view(), y, "regress_head_motion")?;
    let fit = matmul(regs, b.view(), "regress_head_motion")?;
    tracing::debug!(n_t = y.nrows(), n_regs = regs.ncols(), "regressed out motion");
    Ok(&y - &fit)
}

/// Append backward differences to a [T, K] motion parameter matrix → [T, 2K].
///
/// `d[t] = p[t] − p[t−1]`, with `d[0] = 0`. Six rigid-body parameters become
/// the usual twelve-column regressor set.
pub fn with_derivatives(params: ArrayView2<f64>) -> Array2<f64> {
    let (n_t, n_k) = params.dim();
    let mut out = Array2::<f64>::zeros((n_t, 2 * n_k));
    out.slice_mut(s![.., ..n_k]).assign(&params);
    if n_t > 1 {
        let diff = &params.slice(s![1.., ..]) - &params.slice(s![..-1, ..]);
        out.slice_mut(s![1.., n_k..]).assign(&diff);
    }
    out
}
