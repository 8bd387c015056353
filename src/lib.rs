//! # fcmat — fMRI functional connectivity matrices
//!
//! `fcmat` turns a 4-D BOLD volume and an atlas label volume into a packed
//! ROI×ROI connectivity matrix. Every step is a pure function over
//! `ndarray` arrays; the pseudo-inverse runs on `nalgebra`'s SVD.
//!
//! ## Pipeline overview
//!
//! ```text
//! bold.nii.gz [X, Y, Z, T]      atlas labels [X, Y, Z]      motion.par [T, K]
//!   │                                 │                           │
//!   ├─ parcellate ◄───────────────────┘                           │
//!   │     mean voxel signal per label            → Y  [T, R]      │
//!   ├─ remove_drifts                                              │
//!   │     Y − fit(1, z(t), z(t²))                → Yt [T, R]      │
//!   ├─ regress_head_motion ◄──────────────────────────────────────┘
//!   │     Yt − regs · pinv(regs) · Yt            → m  [T, R]
//!   └─ build_connectivity
//!         lower △ = corr(m), upper △ = corr(zscore(m)), diag = 0
//!                                                → corr [R, R]
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use fcmat::{connectivity, PipelineConfig};
//! use fcmat::atlas::{AtlasDir, LabelSource, SchaeferAtlas};
//! use fcmat::io::{load_regressors, load_volume_4d};
//! use std::path::Path;
//!
//! let bold   = load_volume_4d(Path::new("sub-01_bold.nii.gz")).unwrap();
//! let labels = AtlasDir::new("atlases")
//!     .label_volume(&SchaeferAtlas::default())
//!     .unwrap();
//! let regs   = load_regressors(Path::new("sub-01_motion.par")).unwrap();
//!
//! let out = connectivity(bold.view(), labels.view(), regs.view(), &PipelineConfig::default()).unwrap();
//! println!("{} ROIs, corr {:?}", out.roi_labels.len(), out.corr.dim());
//! ```
//!
//! ## Running individual steps
//!
//! ```
//! use fcmat::{build_connectivity, parcellate, regress_head_motion, remove_drifts};
//! use fcmat::{CovarianceEstimator, DEFAULT_RCOND};
//! use ndarray::{Array2, Array3, Array4};
//!
//! let labels = Array3::from_shape_fn((4, 4, 2), |(x, _, _)| (x / 2 + 1) as i32);
//! let bold   = Array4::from_shape_fn((4, 4, 2, 20), |(x, y, _, t)| {
//!     ((t * (x + 1)) as f64 * 0.3).sin() + 0.01 * y as f64
//! });
//! let regs   = Array2::from_shape_fn((20, 1), |(t, _)| (t as f64 * 0.9).cos());
//!
//! let y    = parcellate(bold.view(), labels.view()).unwrap();             // [20, 2]
//! let yt   = remove_drifts(y.view(), DEFAULT_RCOND).unwrap();
//! let m    = regress_head_motion(yt.view(), regs.view(), DEFAULT_RCOND).unwrap();
//! let corr = build_connectivity(m.view(), CovarianceEstimator::Empirical).unwrap();
//! assert_eq!(corr.dim(), (2, 2));
//! assert_eq!(corr[[0, 0]], 0.0);
//! ```

pub mod atlas;
pub mod config;
pub mod correlation;
pub mod detrend;
pub mod error;
pub mod io;
pub mod linalg;
pub mod motion;
pub mod parcellate;

use ndarray::{Array2, ArrayView2, ArrayView3, ArrayView4};

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use atlas::{AtlasDir, InMemoryLabels, LabelSource, SchaeferAtlas};
pub use config::PipelineConfig;
pub use correlation::{
    build_connectivity, correlation, correlation_matrices, pack_triangles,
    unpack_triangles, zscore_columns, CovarianceEstimator,
};
pub use detrend::{drift_design, remove_drifts};
pub use error::{Error, Result};
pub use linalg::{pinv, DEFAULT_RCOND};
pub use motion::{regress_head_motion, with_derivatives};
pub use parcellate::{parcellate, parcellate_with_labels, roi_labels};

/// Every matrix the pipeline produces, in order.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Label of each ROI column.
    pub roi_labels: Vec<i32>,
    /// Parcellated time series `[T, R]`.
    pub time_series: Array2<f64>,
    /// After drift removal `[T, R]`.
    pub detrended: Array2<f64>,
    /// Regressors actually projected out `[T, K]`, derivatives included.
    pub regressors: Array2<f64>,
    /// After motion regression `[T, R]`.
    pub cleaned: Array2<f64>,
    /// Packed connectivity matrix `[R, R]`.
    pub corr: Array2<f64>,
}

/// Run the full connectivity pipeline on one scan.
///
/// # Arguments
///
/// * `volume` – BOLD series, shape `[X, Y, Z, T]`.
/// * `labels` – ROI label volume, shape `[X, Y, Z]`; 0 is background.
/// * `regs`   – nuisance regressors, shape `[T, K]` (e.g. six rigid-body
///   motion parameters, optionally with derivatives).
/// * `cfg`    – see [`PipelineConfig`].
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `labels` does not match the spatial axes of
/// `volume` or `regs` does not have `T` rows; [`Error::SvdNoConvergence`] if
/// a pseudo-inverse fails. Degenerate data (few time points, flat ROIs)
/// yields NaN entries, not errors.
pub fn connectivity(
    volume: ArrayView4<f64>,
    labels: ArrayView3<i32>,
    regs: ArrayView2<f64>,
    cfg: &PipelineConfig,
) -> Result<PipelineOutput> {
    // 1. Parcellation.
    let roi_labels = cfg.roi_layout().unwrap_or_else(|| parcellate::roi_labels(labels));
    let time_series = parcellate_with_labels(volume, labels, &roi_labels)?;

    // 2. Drift removal.
    let detrended = remove_drifts(time_series.view(), cfg.rcond)?;

    // 3. Motion regression.
    let regressors = if cfg.motion_derivatives {
        with_derivatives(regs)
    } else {
        regs.to_owned()
    };
    let cleaned = regress_head_motion(detrended.view(), regressors.view(), cfg.rcond)?;

    // 4. Packed correlation.
    let corr = build_connectivity(cleaned.view(), cfg.estimator)?;

    tracing::info!(
        n_t = time_series.nrows(),
        n_rois = roi_labels.len(),
        n_regs = regressors.ncols(),
        "connectivity pipeline complete"
    );

    Ok(PipelineOutput { roi_labels, time_series, detrended, regressors, cleaned, corr })
}
