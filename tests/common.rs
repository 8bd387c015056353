/// Shared synthetic-data helpers.
use ndarray::{Array1, Array2, ArrayView1};

#[allow(unused)]
/// Orthonormal discrete polynomials of degree `0..=max_degree` on `n` equally
/// spaced points, one per column. Column `d` is orthogonal to every
/// polynomial of lower degree.
pub fn orthogonal_polys(n: usize, max_degree: usize) -> Array2<f64> {
    let centre = (n as f64 - 1.0) / 2.0;
    let mut basis = Array2::<f64>::zeros((n, max_degree + 1));
    for d in 0..=max_degree {
        let mut v = Array1::from_shape_fn(n, |t| (t as f64 - centre).powi(d as i32));
        // Two Gram–Schmidt passes.
        for _ in 0..2 {
            for k in 0..d {
                let b = basis.column(k);
                let proj = v.dot(&b);
                v = &v - &(&b * proj);
            }
        }
        let norm = v.dot(&v).sqrt();
        basis.column_mut(d).assign(&(v / norm));
    }
    basis
}

#[allow(unused)]
/// Textbook Pearson correlation of two series.
pub fn pearson(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let n = a.len() as f64;
    let ma = a.sum() / n;
    let mb = b.sum() / n;
    let mut sab = 0.0;
    let mut saa = 0.0;
    let mut sbb = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        sab += (x - ma) * (y - mb);
        saa += (x - ma) * (x - ma);
        sbb += (y - mb) * (y - mb);
    }
    sab / (saa * sbb).sqrt()
}

#[allow(unused)]
/// Deterministic pseudo-random [rows, cols] matrix in roughly [-1, 1].
pub fn noise(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Array2::from_shape_simple_fn((rows, cols), || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    })
}

#[allow(unused)]
/// Maximum absolute difference between two arrays.
pub fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0_f64, f64::max)
}
