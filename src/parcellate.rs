//! ROI parcellation: [X, Y, Z, T] voxel volume → [T, R] ROI time series.
//!
//! Each column is the mean voxel intensity of one labelled region at every
//! time point. Label 0 is background and never forms a column.
use std::collections::{BTreeSet, HashMap};

use ndarray::{s, Array2, ArrayView3, ArrayView4};

use crate::error::{Error, Result};

/// Sorted unique nonzero labels of `labels`, i.e. the column order of
/// [`parcellate`].
pub fn roi_labels(labels: ArrayView3<i32>) -> Vec<i32> {
    let set: BTreeSet<i32> = labels.iter().copied().filter(|&l| l != 0).collect();
    set.into_iter().collect()
}

/// Average `volume` within every distinct nonzero label of `labels`.
///
/// Returns shape `[T, R]` where `R` is the number of distinct nonzero labels,
/// columns in ascending label order.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `labels` does not cover the first three axes
/// of `volume` exactly.
pub fn parcellate(volume: ArrayView4<f64>, labels: ArrayView3<i32>) -> Result<Array2<f64>> {
    let rois = roi_labels(labels);
    parcellate_with_labels(volume, labels, &rois)
}

/// Like [`parcellate`], but over a caller-supplied ROI list.
///
/// Column `c` averages the voxels labelled `rois[c]`. A label that selects no
/// voxel yields a NaN column (mean of an empty set), so a fixed atlas layout
/// stays aligned across subjects even when a region falls outside the
/// field of view. A 0 entry in `rois` is background and is always NaN.
pub fn parcellate_with_labels(
    volume: ArrayView4<f64>,
    labels: ArrayView3<i32>,
    rois: &[i32],
) -> Result<Array2<f64>> {
    let (nx, ny, nz, n_t) = volume.dim();
    if labels.dim() != (nx, ny, nz) {
        return Err(Error::shape("parcellate", &[nx, ny, nz], labels.shape()));
    }

    // A label listed more than once feeds every column it appears in.
    let mut columns: HashMap<i32, Vec<usize>> = HashMap::new();
    for (c, &l) in rois.iter().enumerate().filter(|&(_, &l)| l != 0) {
        columns.entry(l).or_default().push(c);
    }

    let mut means = Array2::<f64>::zeros((n_t, rois.len()));
    let mut counts = vec![0usize; rois.len()];

    for ((x, y, z), label) in labels.indexed_iter() {
        let Some(cols) = columns.get(label) else { continue };
        let series = volume.slice(s![x, y, z, ..]);
        for &c in cols {
            let mut col = means.column_mut(c);
            col += &series;
            counts[c] += 1;
        }
    }

    for (c, &n) in counts.iter().enumerate() {
        if n == 0 {
            tracing::warn!(label = rois[c], "ROI selects no voxels; column is NaN");
        }
        let n = n as f64;
        means.column_mut(c).mapv_inplace(|v| v / n);
    }

    tracing::debug!(n_t, n_rois = rois.len(), "parcellated volume");
    Ok(means)
}
