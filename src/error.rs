use thiserror::Error;

pub type Result<T> = std::result::Result<T, SvdError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SvdError {
    /// Input is neither `H×W` nor `H×W×3`.
    #[error("unsupported image shape {shape:?}: expected (height, width) or (height, width, 3)")]
    UnsupportedImageShape { shape: Vec<usize> },

    #[error("rank {rank} is outside the valid range 0..={max_rank}")]
    InvalidRank { rank: usize, max_rank: usize },

    #[error(
        "inconsistent SVD factors: U is {u_shape:?}, S has {s_len} values, Vt is {vt_shape:?}"
    )]
    InconsistentFactors {
        u_shape: [usize; 2],
        s_len: usize,
        vt_shape: [usize; 2],
    },

    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}
