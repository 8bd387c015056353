//! Schaefer 2018 atlas selection and label-volume resolution.
//!
//! The pipeline never fetches an atlas itself. A [`LabelSource`] turns an
//! atlas choice into a label volume up front and the resolved
//! `Array3<i32>` is what gets passed into [`crate::connectivity`].
use std::path::PathBuf;

use anyhow::{Context, Result};
use ndarray::Array3;

use crate::error::Error;

/// Recognised parcel counts.
pub const N_ROIS: [usize; 10] = [100, 200, 300, 400, 500, 600, 700, 800, 900, 1000];
/// Recognised Yeo network partitions.
pub const YEO_NETWORKS: [usize; 2] = [7, 17];
/// Recognised resolutions in mm.
pub const RESOLUTIONS_MM: [usize; 2] = [1, 2];

/// One Schaefer 2018 parcellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchaeferAtlas {
    pub n_rois: usize,
    pub yeo_networks: usize,
    pub resolution_mm: usize,
}

impl Default for SchaeferAtlas {
    /// 100 parcels · 17 networks · 2 mm.
    fn default() -> Self {
        Self { n_rois: 100, yeo_networks: 17, resolution_mm: 2 }
    }
}

impl SchaeferAtlas {
    /// Build and validate an atlas choice.
    pub fn new(n_rois: usize, yeo_networks: usize, resolution_mm: usize) -> crate::Result<Self> {
        let atlas = Self { n_rois, yeo_networks, resolution_mm };
        atlas.validate()?;
        Ok(atlas)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !N_ROIS.contains(&self.n_rois) {
            return Err(Error::InvalidAtlas(format!(
                "n_rois = {} (expected one of {N_ROIS:?})", self.n_rois
            )));
        }
        if !YEO_NETWORKS.contains(&self.yeo_networks) {
            return Err(Error::InvalidAtlas(format!(
                "yeo_networks = {} (expected one of {YEO_NETWORKS:?})", self.yeo_networks
            )));
        }
        if !RESOLUTIONS_MM.contains(&self.resolution_mm) {
            return Err(Error::InvalidAtlas(format!(
                "resolution_mm = {} (expected one of {RESOLUTIONS_MM:?})", self.resolution_mm
            )));
        }
        Ok(())
    }

    /// File name of the atlas map as distributed, e.g.
    /// `Schaefer2018_100Parcels_17Networks_order_FSLMNI152_2mm.nii.gz`.
    pub fn file_name(&self) -> String {
        format!(
            "Schaefer2018_{}Parcels_{}Networks_order_FSLMNI152_{}mm.nii.gz",
            self.n_rois, self.yeo_networks, self.resolution_mm
        )
    }
}

/// Resolves an atlas choice into a label volume.
pub trait LabelSource {
    fn label_volume(&self, atlas: &SchaeferAtlas) -> Result<Array3<i32>>;
}

/// Atlas maps stored as NIfTI files in a local directory.
#[derive(Debug, Clone)]
pub struct AtlasDir {
    root: PathBuf,
}

impl AtlasDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, atlas: &SchaeferAtlas) -> PathBuf {
        self.root.join(atlas.file_name())
    }
}

impl LabelSource for AtlasDir {
    fn label_volume(&self, atlas: &SchaeferAtlas) -> Result<Array3<i32>> {
        atlas.validate()?;
        let path = self.path_for(atlas);
        tracing::info!(path = %path.display(), "loading atlas map");
        crate::io::load_label_volume(&path)
            .with_context(|| format!("loading Schaefer atlas from {}", path.display()))
    }
}

/// A label volume that is already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryLabels(pub Array3<i32>);

impl LabelSource for InMemoryLabels {
    fn label_volume(&self, _atlas: &SchaeferAtlas) -> Result<Array3<i32>> {
        Ok(self.0.clone())
    }
}
