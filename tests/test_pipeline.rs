mod common;
use common::{orthogonal_polys, pearson};
use fcmat::{connectivity, CovarianceEstimator, Error, PipelineConfig};
use ndarray::{Array1, Array2, Array3, Array4};

const N_T: usize = 10;

struct Synthetic {
    bold: Array4<f64>,
    labels: Array3<i32>,
    regs: Array2<f64>,
    clean: [Array1<f64>; 2],
}

/// Two ROIs, 10 volumes. Each ROI carries a clean signal plus a linear
/// drift and a multiple of the motion regressor. The clean signals and the
/// regressor are built from discrete orthogonal polynomials of degree 3–5,
/// so both contaminations are exactly removable: the cleaned series must
/// equal the clean signals.
fn synthetic() -> Synthetic {
    let p = orthogonal_polys(N_T, 5);
    let q3 = p.column(3).to_owned();
    let q4 = p.column(4).to_owned();
    let motion = p.column(5).to_owned();

    let s1 = q3.clone();
    let s2 = &q3 + &(&q4 * 0.5);

    let roi = |s: &Array1<f64>, offset: f64, slope: f64, c: f64| {
        Array1::from_shape_fn(N_T, |t| s[t] + offset + slope * (t + 1) as f64 + c * motion[t])
    };
    let r1 = roi(&s1, 2.0, 0.3, 0.8);
    let r2 = roi(&s2, -1.0, 0.1, -0.5);

    // labels[x, y, 0] = x + 1; two voxels per ROI straddle the ROI signal.
    let labels = Array3::from_shape_fn((2, 2, 1), |(x, _, _)| x as i32 + 1);
    let bold = Array4::from_shape_fn((2, 2, 1, N_T), |(x, y, _, t)| {
        let base = if x == 0 { r1[t] } else { r2[t] };
        if y == 0 { base + 0.25 } else { base - 0.25 }
    });
    let regs = motion.insert_axis(ndarray::Axis(1));

    Synthetic { bold, labels, regs, clean: [s1, s2] }
}

#[test]
fn end_to_end_recovers_clean_correlation() {
    let syn = synthetic();
    let out = connectivity(
        syn.bold.view(),
        syn.labels.view(),
        syn.regs.view(),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(out.roi_labels, vec![1, 2]);
    assert_eq!(out.time_series.dim(), (N_T, 2));
    assert_eq!(out.detrended.dim(), (N_T, 2));
    assert_eq!(out.cleaned.dim(), (N_T, 2));

    for c in 0..2 {
        for t in 0..N_T {
            approx::assert_abs_diff_eq!(out.cleaned[[t, c]], syn.clean[c][t], epsilon = 1e-9);
        }
    }

    // s1 = q3, s2 = q3 + q4/2 with unit-norm, zero-mean, orthogonal q's:
    // r = 1 / sqrt(1 + 1/4).
    let expected = 1.0 / 1.25_f64.sqrt();
    approx::assert_abs_diff_eq!(
        pearson(syn.clean[0].view(), syn.clean[1].view()),
        expected,
        epsilon = 1e-12
    );
    approx::assert_abs_diff_eq!(out.corr[[1, 0]], expected, epsilon = 1e-9);
    approx::assert_abs_diff_eq!(out.corr[[0, 1]], expected, epsilon = 1e-9);
    assert_eq!(out.corr[[0, 0]], 0.0);
    assert_eq!(out.corr[[1, 1]], 0.0);
}

#[test]
fn drift_stage_leaves_signal_plus_motion() {
    let syn = synthetic();
    let out = connectivity(
        syn.bold.view(),
        syn.labels.view(),
        syn.regs.view(),
        &PipelineConfig::default(),
    )
    .unwrap();
    for t in 0..N_T {
        let motion = syn.regs[[t, 0]];
        approx::assert_abs_diff_eq!(out.detrended[[t, 0]], syn.clean[0][t] + 0.8 * motion, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(out.detrended[[t, 1]], syn.clean[1][t] - 0.5 * motion, epsilon = 1e-9);
    }
}

#[test]
fn regressor_length_mismatch_fails() {
    let syn = synthetic();
    let short = syn.regs.slice(ndarray::s![..N_T - 1, ..]).to_owned();
    let err = connectivity(
        syn.bold.view(),
        syn.labels.view(),
        short.view(),
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn fixed_layout_adds_nan_rois() {
    let syn = synthetic();
    let cfg = PipelineConfig { fixed_rois: Some(3), ..PipelineConfig::default() };
    let out = connectivity(syn.bold.view(), syn.labels.view(), syn.regs.view(), &cfg).unwrap();
    assert_eq!(out.roi_labels, vec![1, 2, 3]);
    assert_eq!(out.corr.dim(), (3, 3));
    assert!(out.corr[[2, 0]].is_nan());
    assert!(out.corr[[0, 2]].is_nan());
    assert_eq!(out.corr[[2, 2]], 0.0);
    assert!(out.corr[[1, 0]].is_finite());
}

#[test]
fn derivative_regressors_widen_the_nuisance_set() {
    let syn = synthetic();
    let cfg = PipelineConfig { motion_derivatives: true, ..PipelineConfig::default() };
    let out = connectivity(syn.bold.view(), syn.labels.view(), syn.regs.view(), &cfg).unwrap();
    let d = fcmat::with_derivatives(syn.regs.view());
    assert_eq!(out.regressors, d);
    let proj = d.t().dot(&out.cleaned);
    for &v in proj.iter() {
        approx::assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn regressors_are_reported_as_projected() {
    let syn = synthetic();
    let plain = connectivity(
        syn.bold.view(),
        syn.labels.view(),
        syn.regs.view(),
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(plain.regressors.dim(), (N_T, 1));
    assert_eq!(plain.regressors, syn.regs);

    let cfg = PipelineConfig { motion_derivatives: true, ..PipelineConfig::default() };
    let widened = connectivity(syn.bold.view(), syn.labels.view(), syn.regs.view(), &cfg).unwrap();
    assert_eq!(widened.regressors.dim(), (N_T, 2));
}

#[test]
fn ledoit_wolf_estimator_shrinks_the_pair() {
    let syn = synthetic();
    let cfg = PipelineConfig { estimator: CovarianceEstimator::LedoitWolf, ..PipelineConfig::default() };
    let out = connectivity(syn.bold.view(), syn.labels.view(), syn.regs.view(), &cfg).unwrap();
    let expected = 1.0 / 1.25_f64.sqrt();
    assert!(out.corr[[1, 0]] > 0.0);
    assert!(out.corr[[1, 0]] <= expected + 1e-9);
    assert_eq!(out.corr[[0, 0]], 0.0);
}
