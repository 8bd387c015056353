//! Error type for the numeric pipeline.
//!
//! Degenerate inputs (too few time points, zero-variance columns) are not
//! errors: they produce NaN and flow through. Only structural problems land
//! here.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Two arrays that must agree on an axis do not.
    #[error("shape mismatch in {op}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("SVD did not converge for a {rows}×{cols} matrix")]
    SvdNoConvergence { rows: usize, cols: usize },

    #[error("pseudo-inverse failed: {0}")]
    PseudoInverse(&'static str),

    /// Atlas parameter outside the recognised set.
    #[error("invalid Schaefer atlas parameter: {0}")]
    InvalidAtlas(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(op: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Error::ShapeMismatch {
            op,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}
