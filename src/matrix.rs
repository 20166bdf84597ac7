//! This module defines the symmetric view over triangle-only sparse storage.
//!
//! A symmetric matrix is fully determined by one of its triangles, so sparse symmetric
//! matrices are usually stored with only the lower (or only the upper) half populated.
//! [`SymmetricView`] wraps such a matrix and reads it as if the missing half were present:
//! every stored off-diagonal entry `b_ij` is applied twice, once as `b_ij` and once as its
//! mirror `b_ji`. Entries that happen to sit in the other triangle are never read.
//!
//! The view is a borrow. It holds a [`SparseColMatRef`] tied to the caller's matrix, so the
//! matrix must outlive every view (and every operator) built on top of it, and the borrow
//! checker rejects any attempt to mutate it in the meantime.
//!
//! [`SymmetricView`] also implements [`faer::matrix_free::LinOp`], so it can be handed to any
//! matrix-free algorithm that only needs the action of `B` on a block of vectors.

use faer::{
    Index, MatMut, MatRef, Par,
    dyn_stack::{MemStack, StackReq},
    matrix_free::LinOp,
    sparse::{SparseColMatRef, SparseRowMatRef},
};
use serde::{Deserialize, Serialize};

/// Selects which triangle of a symmetric matrix is physically stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Uplo {
    /// Entries with `row >= col` are stored.
    #[default]
    Lower,
    /// Entries with `row <= col` are stored.
    Upper,
}

impl Uplo {
    /// The triangle that holds the same entries after transposing the storage.
    #[inline]
    pub fn transpose(self) -> Self {
        match self {
            Uplo::Lower => Uplo::Upper,
            Uplo::Upper => Uplo::Lower,
        }
    }

    /// Whether the strictly off-diagonal position `(row, col)` belongs to this triangle.
    #[inline]
    fn holds_off_diagonal(self, row: usize, col: usize) -> bool {
        match self {
            Uplo::Lower => row > col,
            Uplo::Upper => row < col,
        }
    }
}

/// A symmetric, read-only view of a sparse matrix stored with a single triangle.
///
/// # Type Parameters
///
/// *   `I`: The index type of the sparse storage, any [`faer::Index`] (`u32`, `u64`, `usize`).
#[derive(Clone, Copy, Debug)]
pub struct SymmetricView<'a, I: Index> {
    mat: SparseColMatRef<'a, I, f64>,
    uplo: Uplo,
}

impl<'a, I: Index> SymmetricView<'a, I> {
    /// Wraps a column-major matrix whose `uplo` triangle holds the data.
    ///
    /// The view does not check that the matrix is square. Operators built on it return an
    /// error for a non-square matrix, and [`LinOp::apply`] panics on one.
    pub fn new(mat: SparseColMatRef<'a, I, f64>, uplo: Uplo) -> Self {
        Self { mat, uplo }
    }

    /// Wraps a row-major matrix whose `uplo` triangle holds the data.
    ///
    /// The row-major storage of `B` is the column-major storage of `B^T`, where the populated
    /// triangle is the opposite one. Because `B` is symmetric the view reads the same matrix.
    pub fn from_csr(mat: SparseRowMatRef<'a, I, f64>, uplo: Uplo) -> Self {
        Self {
            mat: mat.transpose(),
            uplo: uplo.transpose(),
        }
    }

    /// Number of rows of the underlying storage.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.mat.nrows()
    }

    /// Number of columns of the underlying storage. Equal to [`Self::nrows`] for any view an
    /// operator accepts.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.mat.ncols()
    }

    /// The triangle read by this view, in terms of the column-major storage.
    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    /// The underlying column-major storage.
    #[inline]
    pub fn inner(&self) -> SparseColMatRef<'a, I, f64> {
        self.mat
    }

    /// Counts the stored entries that the view actually reads, diagonal included.
    pub fn nnz_stored(&self) -> usize {
        (0..self.ncols())
            .map(|j| {
                self.mat
                    .row_idx_of_col_raw(j)
                    .iter()
                    .filter(|i| {
                        let i = i.zx();
                        i == j || self.uplo.holds_off_diagonal(i, j)
                    })
                    .count()
            })
            .sum()
    }

    /// Extracts the main diagonal. Positions with no stored entry read as zero.
    pub fn diagonal(&self) -> Vec<f64> {
        let n = self.nrows().min(self.ncols());
        let mut diag = vec![0.0; n];
        for (j, d) in diag.iter_mut().enumerate() {
            let rows = self.mat.row_idx_of_col_raw(j);
            let vals = self.mat.val_of_col(j);
            for (i, &v) in rows.iter().zip(vals) {
                if i.zx() == j {
                    *d += v;
                }
            }
        }
        diag
    }

    /// Computes `y = B * x`, reading each stored entry once and mirroring it across the
    /// diagonal.
    ///
    /// `x` and `y` must both have length `ncols()`. The mirror is assumed, not verified.
    pub fn mat_vec(&self, x: &[f64], y: &mut [f64]) {
        let n = self.ncols();
        y[..n].fill(0.0);

        for j in 0..n {
            let x_j = x[j];
            let rows = self.mat.row_idx_of_col_raw(j);
            let vals = self.mat.val_of_col(j);

            // Column `j` of the stored triangle is also row `j` of the mirrored one, so each
            // off-diagonal entry updates both `y_i` and `y_j`.
            let mut acc_j = 0.0;
            for (i, &v) in rows.iter().zip(vals) {
                let i = i.zx();
                if i == j {
                    acc_j += v * x_j;
                } else if self.uplo.holds_off_diagonal(i, j) {
                    y[i] += v * x_j;
                    acc_j += v * x[i];
                }
            }
            y[j] += acc_j;
        }
    }
}

/// Applies the symmetric view column by column, so it can drive faer's matrix-free solvers.
///
/// Each column is gathered into a contiguous scratch vector taken from the [`MemStack`], so
/// `apply` does not allocate once the buffer from [`LinOp::apply_scratch`] is in place.
impl<I: Index> LinOp<f64> for SymmetricView<'_, I> {
    fn apply_scratch(&self, _rhs_ncols: usize, _par: Par) -> StackReq {
        let n = self.mat.nrows();
        StackReq::new::<f64>(n).and(StackReq::new::<f64>(n))
    }

    #[inline]
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }

    fn apply(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>, _par: Par, stack: &mut MemStack) {
        assert_eq!(
            self.mat.nrows(),
            self.mat.ncols(),
            "Non-square operator: a symmetric view needs nrows ({}) == ncols ({}).",
            self.mat.nrows(),
            self.mat.ncols(),
        );
        assert_eq!(
            self.mat.ncols(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.mat.ncols(),
            rhs.nrows(),
        );

        let n = self.mat.nrows();
        let (mut x, stack) = stack.make_with(n, |_| 0.0f64);
        let (mut y, _) = stack.make_with(n, |_| 0.0f64);
        for col in 0..rhs.ncols() {
            for (i, x_i) in x.iter_mut().enumerate() {
                *x_i = rhs[(i, col)];
            }
            self.mat_vec(&x[..], &mut y[..]);
            for (i, &y_i) in y.iter().enumerate() {
                out[(i, col)] = y_i;
            }
        }
    }

    fn conj_apply(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>, par: Par, stack: &mut MemStack) {
        // Real symmetric: the conjugate transpose is the operator itself.
        self.apply(out, rhs, par, stack)
    }
}
