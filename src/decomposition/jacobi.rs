//! Reduced SVD by one-sided (Hestenes) Jacobi rotations.
//!
//! Columns of a working copy of `A` are rotated pairwise until they are
//! mutually orthogonal; the same rotations accumulated on the identity give
//! `V`. The column norms are then the singular values and the normalized
//! columns form `U`.
//!
//! References:
//! * J. Demmel and K. Veselic, "Jacobi's Method is More Accurate than QR",
//!   UT-CS-89-88, 1989.

use crate::{Matrix, Vector};
use ndarray::{ArrayView2, ShapeBuilder, Zip, s};
use std::cmp::Ordering;
use tracing::{debug, warn};

struct OneSidedJacobi {
    work: Matrix,
    v: Matrix,
    tolerance: f64,
    negligible: f64,
}

impl OneSidedJacobi {
    /// Column-major copies of `a` and the identity, so every rotation and
    /// every column product walks contiguous memory.
    fn new(a: ArrayView2<f64>, tolerance: f64) -> Self {
        let (m, n) = a.dim();

        let mut work = Matrix::zeros((m, n).f());
        work.assign(&a);

        let mut v = Matrix::zeros((n, n).f());
        v.diag_mut().fill(1.0);

        // Columns below this squared norm are rounding noise of a
        // rank-deficient input and take no further rotations.
        let frobenius = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let floor = f64::EPSILON * m as f64 * frobenius;

        Self {
            work,
            v,
            tolerance: tolerance.max(f64::EPSILON * m as f64),
            negligible: floor * floor,
        }
    }

    /// Orthogonalize columns `i` and `j`. Returns `true` if they already were.
    fn rotate(&mut self, i: usize, j: usize) -> bool {
        let (alpha, beta, gamma) = {
            let ci = self.work.column(i);
            let cj = self.work.column(j);
            (ci.dot(&ci), cj.dot(&cj), ci.dot(&cj))
        };

        if alpha <= self.negligible || beta <= self.negligible {
            return true;
        }
        if gamma == 0.0 || gamma.abs() <= self.tolerance * (alpha * beta).sqrt() {
            return true;
        }

        let zeta = (beta - alpha) / (2.0 * gamma);
        let t = zeta.signum() / (zeta.abs() + zeta.hypot(1.0));
        let c = 1.0 / t.hypot(1.0);
        let s = c * t;

        rotate_columns(&mut self.work, i, j, c, s);
        rotate_columns(&mut self.v, i, j, c, s);

        false
    }

    /// Cyclic sweeps over all column pairs. Returns the sweeps used and
    /// whether a full sweep finished without rotating.
    fn run(&mut self, max_sweeps: usize) -> (usize, bool) {
        let n = self.work.ncols();

        for sweep in 1..=max_sweeps {
            let mut converged = true;
            for i in 0..n.saturating_sub(1) {
                for j in i + 1..n {
                    if !self.rotate(i, j) {
                        converged = false;
                    }
                }
            }
            if converged {
                return (sweep, true);
            }
        }

        (max_sweeps, false)
    }
}

fn rotate_columns(m: &mut Matrix, i: usize, j: usize, c: f64, s: f64) {
    let (ci, cj) = m.multi_slice_mut((s![.., i], s![.., j]));
    Zip::from(ci).and(cj).for_each(|x, y| {
        let (a, b) = (*x, *y);
        *x = c * a - s * b;
        *y = s * a + c * b;
    });
}

/// Thin SVD of an `m×n` matrix: `U` is `m×r`, `S` has `r` values in
/// descending order, `Vt` is `r×n`, with `r = min(m, n)`.
pub(crate) fn reduced_svd(
    a: ArrayView2<f64>,
    tolerance: f64,
    max_sweeps: usize,
) -> (Matrix, Vector, Matrix) {
    let (m, n) = a.dim();

    // Rotate the shorter side: A^T = U' S V'^T  =>  A = V' S U'^T
    if m < n {
        let (u, s, vt) = reduced_svd(a.t(), tolerance, max_sweeps);
        return (vt.t().to_owned(), s, u.t().to_owned());
    }

    if n == 0 {
        return (Matrix::zeros((m, 0)), Vector::zeros(0), Matrix::zeros((0, 0)));
    }

    let mut jacobi = OneSidedJacobi::new(a, tolerance);

    let (sweeps, converged) = jacobi.run(max_sweeps);
    if converged {
        debug!(rows = m, cols = n, sweeps, "jacobi sweeps converged");
    } else {
        warn!(rows = m, cols = n, sweeps, "jacobi sweeps did not converge");
    }

    let norms: Vec<f64> = jacobi
        .work
        .columns()
        .into_iter()
        .map(|col| col.dot(&col).sqrt())
        .collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| norms[b].partial_cmp(&norms[a]).unwrap_or(Ordering::Equal));

    let largest = order.first().map_or(0.0, |&i| norms[i]);
    let cutoff = largest * f64::EPSILON * m as f64;

    let mut u = Matrix::zeros((m, n));
    let mut s = Vector::zeros(n);
    let mut vt = Matrix::zeros((n, n));
    let mut spanned = vec![false; n];

    for (k, &col) in order.iter().enumerate() {
        let sigma = norms[col];
        s[k] = sigma;
        vt.row_mut(k).assign(&jacobi.v.column(col));

        if sigma > 0.0 && sigma > cutoff {
            u.column_mut(k).assign(&(&jacobi.work.column(col) / sigma));
            spanned[k] = true;
        }
    }

    complete_orthonormal_columns(&mut u, &spanned);

    (u, s, vt)
}

/// Fill the columns of `u` not marked in `spanned` with unit vectors
/// orthogonal to every other column, drawn from the standard basis.
fn complete_orthonormal_columns(u: &mut Matrix, spanned: &[bool]) {
    let m = u.nrows();
    let mut basis: Vec<usize> = (0..spanned.len()).filter(|&k| spanned[k]).collect();

    // A basis vector rejected once stays rejected as the span only grows,
    // so a single forward pass over e_0..e_m suffices.
    let accept = 1.0 / (4.0 * m as f64);
    let mut next = 0;

    for k in (0..spanned.len()).filter(|&k| !spanned[k]) {
        let mut filled = false;

        while next < m && !filled {
            let mut candidate = Vector::zeros(m);
            candidate[next] = 1.0;
            next += 1;

            // Twice, to keep orthogonality at working precision.
            for _ in 0..2 {
                for &b in &basis {
                    let col = u.column(b);
                    let proj = col.dot(&candidate);
                    candidate.scaled_add(-proj, &col);
                }
            }

            let norm_sq = candidate.dot(&candidate);
            if norm_sq >= accept {
                u.column_mut(k).assign(&(candidate / norm_sq.sqrt()));
                basis.push(k);
                filled = true;
            }
        }

        if !filled {
            warn!(column = k, "could not complete orthonormal basis");
        }
    }
}
