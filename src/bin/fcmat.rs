/// fcmat: BOLD volume + atlas + motion regressors → packed connectivity matrix.
///
/// Output format follows the extension of `--output`:
///   .csv          corr only, one row per line
///   .safetensors  corr [R, R] f64, roi_labels [R] i32, and with
///                 `--save-steps` also time_series / detrended / cleaned [T, R]
///                 and regressors [T, K]
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fcmat::{
    atlas::{AtlasDir, LabelSource, SchaeferAtlas},
    connectivity,
    io::{load_label_volume, load_regressors, load_volume_4d, write_matrix_csv, StWriter},
    CovarianceEstimator, PipelineConfig,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Estimator {
    Empirical,
    LedoitWolf,
}

impl From<Estimator> for CovarianceEstimator {
    fn from(e: Estimator) -> Self {
        match e {
            Estimator::Empirical => CovarianceEstimator::Empirical,
            Estimator::LedoitWolf => CovarianceEstimator::LedoitWolf,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fcmat", about = "fMRI functional connectivity matrix")]
struct Args {
    /// 4-D BOLD NIfTI (.nii / .nii.gz).
    #[arg(long)]
    bold: PathBuf,

    /// Label volume NIfTI. Overrides --atlas-dir.
    #[arg(long, conflicts_with = "atlas_dir")]
    labels: Option<PathBuf>,

    /// Directory holding Schaefer 2018 atlas maps.
    #[arg(long)]
    atlas_dir: Option<PathBuf>,

    /// Schaefer parcel count (100..1000 in steps of 100).
    #[arg(long, default_value_t = 100)]
    n_rois: usize,

    /// Schaefer Yeo network partition (7 or 17).
    #[arg(long, default_value_t = 17)]
    yeo_networks: usize,

    /// Schaefer atlas resolution in mm (1 or 2).
    #[arg(long, default_value_t = 2)]
    resolution_mm: usize,

    /// Motion regressors, one row per volume.
    #[arg(long)]
    regressors: PathBuf,

    /// Append backward-difference derivatives to the regressors.
    #[arg(long)]
    derivatives: bool,

    /// Covariance estimator for the correlation matrices.
    #[arg(long, value_enum, default_value_t = Estimator::Empirical)]
    estimator: Estimator,

    /// Keep the atlas's full 1..=n_rois column layout (NaN for absent ROIs).
    #[arg(long)]
    fixed_rois: bool,

    /// Output path (.csv or .safetensors).
    #[arg(long)]
    output: PathBuf,

    /// Also write intermediate matrices (safetensors output only).
    #[arg(long)]
    save_steps: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let atlas = SchaeferAtlas::new(args.n_rois, args.yeo_networks, args.resolution_mm)?;

    let labels = match (&args.labels, &args.atlas_dir) {
        (Some(path), _) => load_label_volume(path)?,
        (None, Some(dir)) => AtlasDir::new(dir).label_volume(&atlas)?,
        (None, None) => bail!("one of --labels or --atlas-dir is required"),
    };
    let bold = load_volume_4d(&args.bold)?;
    let regs = load_regressors(&args.regressors)?;
    tracing::info!(
        bold = ?bold.dim(),
        labels = ?labels.dim(),
        regs = ?regs.dim(),
        "inputs loaded"
    );

    let cfg = PipelineConfig {
        motion_derivatives: args.derivatives,
        estimator: args.estimator.into(),
        fixed_rois: args.fixed_rois.then_some(atlas.n_rois),
        ..PipelineConfig::default()
    };
    let out = connectivity(bold.view(), labels.view(), regs.view(), &cfg)
        .context("connectivity pipeline failed")?;

    let n_nan = out.corr.iter().filter(|v| v.is_nan()).count();
    if n_nan > 0 {
        tracing::warn!(n_nan, "connectivity matrix contains NaN entries");
    }

    match args.output.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            if args.save_steps {
                tracing::warn!("--save-steps ignored for CSV output");
            }
            write_matrix_csv(&out.corr, &args.output)?;
        }
        Some("safetensors") => {
            let mut w = StWriter::new();
            w.add_f64_arr2("corr", &out.corr);
            w.add_i32("roi_labels", &out.roi_labels, &[out.roi_labels.len()]);
            if args.save_steps {
                w.add_f64_arr2("time_series", &out.time_series);
                w.add_f64_arr2("detrended", &out.detrended);
                w.add_f64_arr2("regressors", &out.regressors);
                w.add_f64_arr2("cleaned", &out.cleaned);
            }
            w.write(&args.output)?;
        }
        _ => bail!("{}: output must end in .csv or .safetensors", args.output.display()),
    }

    tracing::info!(path = %args.output.display(), n_rois = out.roi_labels.len(), "written");
    Ok(())
}
