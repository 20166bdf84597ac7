//! Deterministic sparse symmetric test matrices, stored as a single triangle.

use crate::matrix::Uplo;
use faer::sparse::{SparseColMat, Triplet};

/// Pushes `(row, col, val)` and its mirror, keeping only the copy inside `uplo`.
fn push_symmetric(
    triplets: &mut Vec<Triplet<usize, usize, f64>>,
    row: usize,
    col: usize,
    val: f64,
    uplo: Uplo,
) {
    let (row, col) = match uplo {
        Uplo::Lower => (row.max(col), row.min(col)),
        Uplo::Upper => (row.min(col), row.max(col)),
    };
    triplets.push(Triplet { row, col, val });
}

/// The `n x n` matrix `tridiag(off, diag, off)`, one triangle stored.
///
/// Positive definite whenever `diag > 2 |off|`.
pub fn tridiagonal(n: usize, diag: f64, off: f64, uplo: Uplo) -> SparseColMat<usize, f64> {
    let mut triplets = Vec::with_capacity(2 * n);
    for i in 0..n {
        push_symmetric(&mut triplets, i, i, diag, uplo);
        if i + 1 < n {
            push_symmetric(&mut triplets, i + 1, i, off, uplo);
        }
    }
    SparseColMat::try_new_from_triplets(n, n, &triplets)
        .expect("Failed to construct sparse tridiagonal matrix.")
}

/// The 5-point Laplacian on a `grid x grid` mesh with Dirichlet boundaries, plus
/// `shift * I`. One triangle stored, dimension `grid^2`.
///
/// The Laplacian itself is positive definite, so the result is for any `shift >= 0`.
pub fn laplacian_2d(grid: usize, shift: f64, uplo: Uplo) -> SparseColMat<usize, f64> {
    let n = grid * grid;
    let idx = |i: usize, j: usize| i * grid + j;
    let mut triplets = Vec::with_capacity(3 * n);

    for i in 0..grid {
        for j in 0..grid {
            let k = idx(i, j);
            push_symmetric(&mut triplets, k, k, 4.0 + shift, uplo);
            if j + 1 < grid {
                push_symmetric(&mut triplets, k, idx(i, j + 1), -1.0, uplo);
            }
            if i + 1 < grid {
                push_symmetric(&mut triplets, k, idx(i + 1, j), -1.0, uplo);
            }
        }
    }
    SparseColMat::try_new_from_triplets(n, n, &triplets)
        .expect("Failed to construct sparse Laplacian matrix.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SymmetricView;

    #[test]
    fn test_tridiagonal_triangles() {
        let lower = tridiagonal(4, 2.0, -1.0, Uplo::Lower);
        let upper = tridiagonal(4, 2.0, -1.0, Uplo::Upper);
        for t in lower.triplet_iter() {
            assert!(t.row >= t.col);
        }
        for t in upper.triplet_iter() {
            assert!(t.row <= t.col);
        }
        assert_eq!(lower.triplet_iter().count(), 7);
        assert_eq!(upper.triplet_iter().count(), 7);
    }

    #[test]
    fn test_laplacian_rows_sum_to_shift_in_interior() {
        let grid = 5;
        let b = laplacian_2d(grid, 0.5, Uplo::Lower);
        let view = SymmetricView::new(b.as_ref(), Uplo::Lower);

        let n = grid * grid;
        let mut y = vec![0.0; n];
        view.mat_vec(&vec![1.0; n], &mut y);

        // The centre node has four neighbours, a corner only two.
        assert!((y[2 * grid + 2] - 0.5).abs() < 1e-14);
        assert!((y[0] - 2.5).abs() < 1e-14);
        assert_eq!(view.nnz_stored(), n + 2 * grid * (grid - 1));
    }
}
