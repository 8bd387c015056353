//! Connectivity matrix construction.
//!
//! Two ROI×ROI correlation matrices are computed and packed into one:
//!
//! ```text
//!            ┌                       ┐
//!            │ 0     zd  zd  zd      │   upper (j > i): correlation of the
//!   corr  =  │ fc    0   zd  zd      │                  column-z-scored data
//!            │ fc    fc  0   zd      │   lower (j < i): correlation of m
//!            │ fc    fc  fc  0       │   diagonal:      0
//!            └                       ┘
//! ```
//!
//! Pearson correlation is invariant to per-column standardisation, so both
//! triangles agree up to floating-point noise. Both are still computed and
//! stored: the packed layout is the output format consumers read.
use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Error, Result};

/// How the covariance behind each correlation matrix is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarianceEstimator {
    /// Sample covariance: plain Pearson correlation.
    #[default]
    Empirical,
    /// Ledoit–Wolf shrunk covariance of the standardised signals, converted
    /// to correlation. Off-diagonal values are Pearson values scaled by
    /// `1 − shrinkage`.
    LedoitWolf,
}

/// Per-column z-score: `(m − mean) / std`, std with the `N − 1` divisor.
///
/// NaN entries are ignored when computing mean and std and stay NaN in the
/// output. Zero-variance columns become NaN.
pub fn zscore_columns(m: ArrayView2<f64>) -> Array2<f64> {
    let mut out = m.to_owned();
    for mut col in out.axis_iter_mut(Axis(1)) {
        let (n, sum) = col
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0usize, 0.0_f64), |(n, s), &v| (n + 1, s + v));
        let mean = sum / n as f64;
        let ss: f64 = col
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| (v - mean).powi(2))
            .sum();
        let std = (ss / (n as f64 - 1.0)).sqrt();
        col.mapv_inplace(|v| (v - mean) / std);
    }
    out
}

/// Correlation matrix ([R, R]) over the columns of `m` ([T, R]).
pub fn correlation(m: ArrayView2<f64>, estimator: CovarianceEstimator) -> Array2<f64> {
    match estimator {
        CovarianceEstimator::Empirical => {
            let c = center_columns(m);
            cov_to_corr(c.t().dot(&c))
        }
        CovarianceEstimator::LedoitWolf => cov_to_corr(ledoit_wolf_covariance(m)),
    }
}

/// One correlation matrix per input, all inputs sharing the same ROI count.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the inputs disagree on the number of columns.
pub fn correlation_matrices(
    inputs: &[ArrayView2<f64>],
    estimator: CovarianceEstimator,
) -> Result<Vec<Array2<f64>>> {
    if let Some(first) = inputs.first() {
        let n_r = first.ncols();
        if let Some(bad) = inputs.iter().find(|m| m.ncols() != n_r) {
            return Err(Error::shape("correlation_matrices", &[n_r], &[bad.ncols()]));
        }
    }
    Ok(inputs.iter().map(|m| correlation(*m, estimator)).collect())
}

/// Pack the strict lower triangle of `lower` and the strict upper triangle of
/// `upper` into one matrix with a zero diagonal.
///
/// Masking is multiplicative (`x · 0`), so a NaN in a discarded triangle
/// still poisons the sum.
pub fn pack_triangles(lower: ArrayView2<f64>, upper: ArrayView2<f64>) -> Result<Array2<f64>> {
    let n = lower.nrows();
    if lower.dim() != (n, n) {
        return Err(Error::shape("pack_triangles", &[n, n], lower.shape()));
    }
    if upper.dim() != (n, n) {
        return Err(Error::shape("pack_triangles", &[n, n], upper.shape()));
    }

    // Lower: keep j <= i, then clear the diagonal.
    let lower_mask = Array2::from_shape_fn((n, n), |(i, j)| if j <= i { 1.0 } else { 0.0 });
    let mut lo = &lower * &lower_mask;
    lo.diag_mut().fill(0.0);

    // Upper: keep j >= i, then clear the diagonal.
    let upper_mask = Array2::from_shape_fn((n, n), |(i, j)| if j >= i { 1.0 } else { 0.0 });
    let mut up = &upper * &upper_mask;
    up.diag_mut().fill(0.0);

    Ok(lo + up)
}

/// Build the packed connectivity matrix of `m` ([T, R]) → [R, R].
pub fn build_connectivity(m: ArrayView2<f64>, estimator: CovarianceEstimator) -> Result<Array2<f64>> {
    let zd = zscore_columns(m);
    let fc = correlation(m, estimator);
    let zd_fc = correlation(zd.view(), estimator);
    let corr = pack_triangles(fc.view(), zd_fc.view())?;
    tracing::debug!(n_rois = corr.nrows(), ?estimator, "built connectivity matrix");
    Ok(corr)
}

/// Split a packed matrix back into its two symmetric correlation matrices
/// `(raw, standardised)`, each with a unit diagonal.
pub fn unpack_triangles(corr: ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
    let n = corr.nrows();
    if corr.dim() != (n, n) {
        return Err(Error::shape("unpack_triangles", &[n, n], corr.shape()));
    }
    let raw = Array2::from_shape_fn((n, n), |(i, j)| match i.cmp(&j) {
        std::cmp::Ordering::Equal => 1.0,
        _ => corr[[i.max(j), i.min(j)]],
    });
    let zd = Array2::from_shape_fn((n, n), |(i, j)| match i.cmp(&j) {
        std::cmp::Ordering::Equal => 1.0,
        _ => corr[[i.min(j), i.max(j)]],
    });
    Ok((raw, zd))
}

fn center_columns(m: ArrayView2<f64>) -> Array2<f64> {
    let n_t = m.nrows() as f64;
    let means = m.sum_axis(Axis(0)) / n_t;
    &m - &means
}

/// `cov_ij / sqrt(cov_ii · cov_jj)` with the diagonal forced to exactly 1.
fn cov_to_corr(mut cov: Array2<f64>) -> Array2<f64> {
    let inv_d = cov.diag().mapv(|v| 1.0 / v.sqrt());
    for ((i, j), v) in cov.indexed_iter_mut() {
        *v *= inv_d[i] * inv_d[j];
    }
    cov.diag_mut().fill(1.0);
    cov
}

/// Ledoit–Wolf shrunk covariance of the z-scored (`ddof = 0`) columns of `m`.
fn ledoit_wolf_covariance(m: ArrayView2<f64>) -> Array2<f64> {
    let x = standardize_columns(m);
    let n = x.nrows() as f64;
    let emp_cov = x.t().dot(&x) / n;
    let (shrinkage, mu) = ledoit_wolf_shrinkage(x.view());

    let mut shrunk = emp_cov * (1.0 - shrinkage);
    shrunk.diag_mut().mapv_inplace(|v| v + shrinkage * mu);
    shrunk
}

/// Centre each column and divide by its population std; flat columns keep
/// a unit divisor.
fn standardize_columns(m: ArrayView2<f64>) -> Array2<f64> {
    let n = m.nrows() as f64;
    let mut x = center_columns(m);
    for mut col in x.axis_iter_mut(Axis(1)) {
        let std = (col.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
        let std = if std < f64::EPSILON { 1.0 } else { std };
        col.mapv_inplace(|v| v / std);
    }
    x
}

/// Ledoit–Wolf shrinkage coefficient of centred data `x` ([T, R]) and the
/// shrinkage target `mu = trace(S) / R`. A single column is never shrunk.
fn ledoit_wolf_shrinkage(x: ArrayView2<f64>) -> (f64, f64) {
    let (n_t, n_r) = x.dim();
    let n = n_t as f64;
    let p = n_r as f64;

    let x2 = x.mapv(|v| v * v);
    let emp_cov_trace = x2.sum_axis(Axis(0)) / n;
    let mu = emp_cov_trace.sum() / p;
    if n_r == 1 {
        return (0.0, mu);
    }

    let beta_ = x2.t().dot(&x2).sum();
    let delta_ = x.t().dot(&x).mapv(|v| v * v).sum() / (n * n);
    let beta = (beta_ / n - delta_) / (n * p);
    let delta = (delta_ - 2.0 * mu * emp_cov_trace.sum() + p * mu * mu) / p;
    let beta = beta.min(delta);
    let shrinkage = if beta == 0.0 { 0.0 } else { beta / delta };
    (shrinkage, mu)
}
