use crate::error::{Result, SvdError};
use crate::{Matrix, Vector};
use ndarray::s;

/// Rank-`rank` approximation `U[:, :rank] · diag(S[:rank]) · Vt[:rank, :]`.
///
/// Only the leading slices take part in the product, so the cost grows with
/// `rank` rather than with the full rank of the factors. Rank 0 gives an
/// all-zero matrix of the original shape.
///
/// # Errors
/// `InvalidRank` if `rank` exceeds the number of singular values, and
/// `InconsistentFactors` if `U`, `S` and `Vt` do not share the inner dimension.
pub fn low_rank_approximate(u: &Matrix, s: &Vector, vt: &Matrix, rank: usize) -> Result<Matrix> {
    let max_rank = s.len();

    if u.ncols() != max_rank || vt.nrows() != max_rank {
        return Err(SvdError::InconsistentFactors {
            u_shape: [u.nrows(), u.ncols()],
            s_len: max_rank,
            vt_shape: [vt.nrows(), vt.ncols()],
        });
    }

    if rank > max_rank {
        return Err(SvdError::InvalidRank { rank, max_rank });
    }

    let (m, n) = (u.nrows(), vt.ncols());
    if rank == 0 {
        return Ok(Matrix::zeros((m, n)));
    }

    // Scaling the columns of U stands in for multiplying by diag(S)
    let weighted = &u.slice(s![.., ..rank]) * &s.slice(s![..rank]);
    Ok(weighted.dot(&vt.slice(s![..rank, ..])))
}
