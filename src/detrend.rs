//! Scanner drift removal.
//!
//! Projects out a constant, a linear ramp and a quadratic ramp from every
//! ROI time series:
//!
//! ```text
//! XX = [ 1 ; z(t) ; z(t²) ]          t = 1..T, z = z-score (ddof = 0)   [3, T]
//! B  = pinv(XX)ᵀ · Y                                                    [3, R]
//! Yt = Y − XXᵀ · B                                                      [T, R]
//! ```
use ndarray::{Array2, ArrayView2, Axis};

use crate::error::Result;
use crate::linalg::{matmul, pinv};

/// The [3, T] drift design matrix: ones, z-scored `t`, z-scored `t²`.
pub fn drift_design(n_t: usize) -> Array2<f64> {
    let mut xx = Array2::<f64>::ones((3, n_t));
    for (i, mut row) in xx.axis_iter_mut(Axis(0)).enumerate().skip(1) {
        for (k, v) in row.iter_mut().enumerate() {
            *v = ((k + 1) as f64).powi(i as i32);
        }
        let n = n_t as f64;
        let mean = row.sum() / n;
        let std = (row.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        row.mapv_inplace(|v| (v - mean) / std);
    }
    xx
}

/// Remove the best-fit quadratic-plus-constant trend from each column of
/// `y` ([T, R]).
///
/// With `T < 3` the design is rank-deficient; the pseudo-inverse still
/// returns, but the result is numerically meaningless (NaN for `T = 1`).
pub fn remove_drifts(y: ArrayView2<f64>, rcond: f64) -> Result<Array2<f64>> {
    let n_t = y.nrows();
    if n_t < 3 {
        tracing::warn!(n_t, "fewer than 3 time points; drift design is rank-deficient");
    }
    let xx = drift_design(n_t);
    let p = pinv(xx.view(), rcond)?;
    let b = matmul(p.t(), y, "remove_drifts")?;
    let fit = matmul(xx.t(), b.view(), "remove_drifts")?;
    tracing::debug!(n_t, n_rois = y.ncols(), "removed quadratic drift");
    Ok(&y - &fit)
}
