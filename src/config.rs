//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the connectivity
//! pipeline. The defaults reproduce the reference numerics: numpy's `pinv`
//! cutoff, caller-supplied regressors used as-is, plain Pearson correlation,
//! and ROI columns taken from whatever labels the label volume contains.
use crate::correlation::CovarianceEstimator;
use crate::linalg::DEFAULT_RCOND;

/// Configuration for [`crate::connectivity`].
///
/// All fields are `pub`, so struct-update syntax works:
///
/// ```
/// use fcmat::{CovarianceEstimator, PipelineConfig};
///
/// let cfg = PipelineConfig {
///     estimator: CovarianceEstimator::LedoitWolf,
///     motion_derivatives: true,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.fixed_rois, None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Relative cutoff for small singular values in every pseudo-inverse.
    ///
    /// Singular values `<= rcond · σ_max` are treated as zero.
    ///
    /// Default: `1e-15`.
    pub rcond: f64,

    /// Append backward-difference derivatives to the motion regressors
    /// before regression (six parameters → twelve regressors).
    ///
    /// Leave off when the regressor file already carries derivatives.
    ///
    /// Default: `false`.
    pub motion_derivatives: bool,

    /// Covariance estimator behind both correlation matrices.
    ///
    /// Default: [`CovarianceEstimator::Empirical`] (Pearson).
    pub estimator: CovarianceEstimator,

    /// Use a fixed ROI layout `1..=n` instead of the labels present in the
    /// label volume. Labels missing from the volume give NaN columns (and
    /// NaN rows/columns in the connectivity matrix).
    ///
    /// Default: `None`.
    pub fixed_rois: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rcond: DEFAULT_RCOND,
            motion_derivatives: false,
            estimator: CovarianceEstimator::Empirical,
            fixed_rois: None,
        }
    }
}

impl PipelineConfig {
    /// ROI label list for parcellation, if a fixed layout is configured.
    pub fn roi_layout(&self) -> Option<Vec<i32>> {
        self.fixed_rois.map(|n| (1..=n as i32).collect())
    }
}
