//! This module provides the operator consumed by generalized eigensolvers in regular inverse
//! mode.
//!
//! For `A x = lambda B x` with `A` symmetric and `B` sparse symmetric positive definite, the
//! eigensolver only ever needs two actions of `B`: the product `y = B x` and the solve
//! `y = B^{-1} x`. [`RegularInverseOp`] is that contract, and [`SparseRegularInverse`] is its
//! implementation for a borrowed sparse matrix stored as a single triangle.
//!
//! Construction is the only step that can fail. It checks that `B` is square and builds the
//! conjugate gradient state once; every later `solve` reuses it and always returns a result,
//! approximate if the iteration cap was reached. Callers that want to know how good that
//! result is can use [`SparseRegularInverse::solve_with_info`].

use crate::{
    algorithms::{CgInfo, CgParams, cg::ConjugateGradient},
    error::MatOpError,
    matrix::{SymmetricView, Uplo},
};
use faer::{
    Index,
    sparse::{SparseColMatRef, SparseRowMatRef},
};

/// Matrix operations required by a symmetric generalized eigensolver in regular inverse mode.
///
/// Buffers are caller-allocated and must have length `rows()`.
pub trait RegularInverseOp {
    /// Number of rows of `B`.
    fn rows(&self) -> usize;

    /// Number of columns of `B`.
    fn cols(&self) -> usize;

    /// Writes `B * x_in` into `y_out`.
    fn mat_prod(&self, x_in: &[f64], y_out: &mut [f64]);

    /// Writes an approximation of `B^{-1} * x_in` into `y_out`.
    ///
    /// This never fails. Takes `&mut self` because the solver reuses internal scratch space.
    fn solve(&mut self, x_in: &[f64], y_out: &mut [f64]);
}

/// `B x` and `B^{-1} x` for a sparse symmetric positive-definite `B`.
///
/// The matrix is borrowed for `'a`, and must not change while the operator exists. Only the
/// triangle selected by [`Uplo`] is read, both by the product and by the solver.
///
/// # Example
///
/// ```rust
/// use faer::sparse::{SparseColMat, Triplet};
/// use sparse_regular_inverse::{RegularInverseOp, SparseRegularInverse, Uplo};
///
/// // B = [[4, 1], [1, 3]], lower triangle stored.
/// let b = SparseColMat::<usize, f64>::try_new_from_triplets(
///     2,
///     2,
///     &[
///         Triplet { row: 0, col: 0, val: 4.0 },
///         Triplet { row: 1, col: 0, val: 1.0 },
///         Triplet { row: 1, col: 1, val: 3.0 },
///     ],
/// )
/// .unwrap();
///
/// let mut op = SparseRegularInverse::new(b.as_ref(), Uplo::Lower).unwrap();
///
/// let mut y = [0.0; 2];
/// op.mat_prod(&[1.0, 0.0], &mut y);
/// assert_eq!(y, [4.0, 1.0]);
///
/// let mut x = [0.0; 2];
/// op.solve(&y, &mut x);
/// assert!((x[0] - 1.0).abs() < 1e-6 && x[1].abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct SparseRegularInverse<'a, I: Index> {
    n: usize,
    mat: SymmetricView<'a, I>,
    cg: ConjugateGradient<'a, I>,
}

impl<'a, I: Index> SparseRegularInverse<'a, I> {
    /// Builds the operator for a column-major matrix with the `uplo` triangle stored, using the
    /// default solver parameters.
    ///
    /// # Errors
    /// [`crate::error::MatOpErrorKind::InvalidDimension`] if the matrix is not square.
    pub fn new(mat: SparseColMatRef<'a, I, f64>, uplo: Uplo) -> Result<Self, MatOpError> {
        Self::with_params(SymmetricView::new(mat, uplo), CgParams::default())
    }

    /// Builds the operator for a row-major matrix with the `uplo` triangle stored.
    pub fn from_csr(mat: SparseRowMatRef<'a, I, f64>, uplo: Uplo) -> Result<Self, MatOpError> {
        Self::with_params(SymmetricView::from_csr(mat, uplo), CgParams::default())
    }

    /// Builds the operator over an existing view with explicit solver parameters.
    ///
    /// # Errors
    /// * [`crate::error::MatOpErrorKind::InvalidDimension`] if the matrix is not square.
    /// * [`crate::error::MatOpErrorKind::InvalidParameter`] if `params` is out of range.
    pub fn with_params(mat: SymmetricView<'a, I>, params: CgParams) -> Result<Self, MatOpError> {
        let cg = ConjugateGradient::compute(mat, params)?;
        let n = mat.nrows();

        log::debug!(
            "regular inverse operator ready: n = {n}, {} stored entries ({:?} triangle), max {} cg iterations",
            mat.nnz_stored(),
            mat.uplo(),
            cg.max_iterations(),
        );

        Ok(Self { n, mat, cg })
    }

    /// The symmetric view the operator reads.
    #[inline]
    pub fn view(&self) -> &SymmetricView<'a, I> {
        &self.mat
    }

    /// The conjugate gradient state behind [`RegularInverseOp::solve`].
    #[inline]
    pub fn solver(&self) -> &ConjugateGradient<'a, I> {
        &self.cg
    }

    /// Same as [`RegularInverseOp::solve`], also returning the iteration diagnostics.
    pub fn solve_with_info(&mut self, x_in: &[f64], y_out: &mut [f64]) -> CgInfo {
        self.cg.solve(x_in, y_out)
    }

    /// Diagnostics of the most recent solve, if any.
    #[inline]
    pub fn last_info(&self) -> Option<CgInfo> {
        self.cg.last_info()
    }
}

impl<I: Index> RegularInverseOp for SparseRegularInverse<'_, I> {
    #[inline]
    fn rows(&self) -> usize {
        self.n
    }

    #[inline]
    fn cols(&self) -> usize {
        self.n
    }

    #[inline]
    fn mat_prod(&self, x_in: &[f64], y_out: &mut [f64]) {
        self.mat.mat_vec(x_in, y_out);
    }

    #[inline]
    fn solve(&mut self, x_in: &[f64], y_out: &mut [f64]) {
        // Non-convergence is not reported here; see `solve_with_info`.
        self.cg.solve(x_in, y_out);
    }
}
