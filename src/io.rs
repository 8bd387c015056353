//! File I/O: NIfTI volumes in, regressor text files in, safetensors / CSV out.
use anyhow::{bail, Context, Result};
use ndarray::{Array2, Array3, Array4, ArrayD, Axis, Ix3, Ix4};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::Path;

// ── NIfTI ────────────────────────────────────────────────────────────────────

fn read_nifti(path: &Path) -> Result<ArrayD<f64>> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("reading NIfTI {}", path.display()))?;
    let arr = obj
        .into_volume()
        .into_ndarray::<f64>()
        .with_context(|| format!("converting {} to ndarray", path.display()))?;
    Ok(arr)
}

/// Load a 4-D BOLD series as `[X, Y, Z, T]`, scaling applied.
///
/// A 3-D image is accepted as a single time point.
pub fn load_volume_4d(path: &Path) -> Result<Array4<f64>> {
    let arr = read_nifti(path)?;
    let vol = match arr.ndim() {
        3 => arr.insert_axis(Axis(3)).into_dimensionality::<Ix4>()?,
        4 => arr.into_dimensionality::<Ix4>()?,
        n => bail!("{}: expected a 4-D volume, got {n}-D", path.display()),
    };
    tracing::debug!(shape = ?vol.dim(), path = %path.display(), "loaded BOLD volume");
    Ok(vol)
}

/// Load a 3-D label volume. Voxel values are rounded to the nearest integer.
///
/// A 4-D image with a singleton fourth axis is accepted. Non-finite voxels
/// become background (0) with a warning.
pub fn load_label_volume(path: &Path) -> Result<Array3<i32>> {
    let arr = read_nifti(path)?;
    let shape = arr.shape().to_vec();
    let vol = match shape.as_slice() {
        [_, _, _] => arr.into_dimensionality::<Ix3>()?,
        [_, _, _, 1] => arr.index_axis_move(Axis(3), 0).into_dimensionality::<Ix3>()?,
        s => bail!("{}: expected a 3-D label volume, got shape {s:?}", path.display()),
    };
    let n_non_finite = vol.iter().filter(|v| !v.is_finite()).count();
    if n_non_finite > 0 {
        tracing::warn!(n_non_finite, path = %path.display(), "non-finite label voxels set to background");
    }
    Ok(vol.mapv(|v| if v.is_finite() { v.round() as i32 } else { 0 }))
}

// ── Regressors ───────────────────────────────────────────────────────────────

/// Parse a `[T, K]` regressor matrix from text.
///
/// One row per time point, values separated by whitespace and/or commas.
/// Blank lines and lines starting with `#` are skipped (FSL `.par`, fMRIPrep
/// column extracts, `numpy.savetxt` output all parse).
pub fn parse_regressors(text: &str) -> Result<Array2<f64>> {
    let mut values = Vec::new();
    let mut n_cols = None;
    let mut n_rows = 0usize;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row: Vec<f64> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>()
                    .with_context(|| format!("line {}: bad number {s:?}", lineno + 1))
            })
            .collect::<Result<_>>()?;
        match n_cols {
            None => n_cols = Some(row.len()),
            Some(k) if k != row.len() => {
                bail!("line {}: expected {k} columns, got {}", lineno + 1, row.len())
            }
            Some(_) => {}
        }
        values.extend(row);
        n_rows += 1;
    }

    let n_cols = n_cols.context("regressor file has no data rows")?;
    Ok(Array2::from_shape_vec((n_rows, n_cols), values)?)
}

/// Read and parse a regressor file (see [`parse_regressors`]).
pub fn load_regressors(path: &Path) -> Result<Array2<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading regressors {}", path.display()))?;
    parse_regressors(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── Writers ──────────────────────────────────────────────────────────────────

/// Write a matrix as comma-separated text, one row per line.
pub fn write_matrix_csv(arr: &Array2<f64>, path: &Path) -> Result<()> {
    use std::io::Write;
    let mut f = std::io::BufWriter::new(
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
    );
    for row in arr.rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(f, "{}", line.join(","))?;
    }
    f.flush()?;
    Ok(())
}

/// Minimal safetensors writer for F64 and I32 tensors.
///
/// ```rust,no_run
/// use fcmat::io::StWriter;
/// use ndarray::Array2;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64_arr2("corr", &Array2::zeros((3, 3)));
/// w.add_i32("roi_labels", &[1, 2, 3], &[3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    /// Row-major copy of a 2-D array.
    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}
