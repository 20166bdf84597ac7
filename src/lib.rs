//! Sparse matrix operations for symmetric generalized eigensolvers in regular inverse mode.
//!
//! For the generalized eigenproblem $\mathbf{A}\mathbf{x} = \lambda \mathbf{B}\mathbf{x}$ with
//! $\mathbf{A}$ symmetric and $\mathbf{B}$ sparse symmetric positive definite, a Krylov
//! eigensolver in regular inverse mode never needs $\mathbf{B}$ itself, only two of its
//! actions:
//!
//! - the product $\mathbf{y} = \mathbf{B}\mathbf{x}$,
//! - the solve $\mathbf{y} = \mathbf{B}^{-1}\mathbf{x}$.
//!
//! This crate provides both for a sparse matrix stored as a single triangle, behind the
//! [`RegularInverseOp`] trait the eigensolver can be written against.
//!
//! ## Design
//!
//! **Symmetric view** ([`matrix::SymmetricView`]): reads the populated triangle of a
//! [`faer`] sparse matrix (column- or row-major, any index type) and mirrors it across the
//! diagonal, so the product costs one pass over the stored entries.
//!
//! **Conjugate gradient** ([`algorithms::cg::ConjugateGradient`]): a Jacobi-preconditioned CG
//! whose state (preconditioner, scratch vectors) is built once and reused by every solve.
//!
//! **Operator** ([`SparseRegularInverse`]): borrows the matrix and owns the solver state.
//! Construction fails only if the matrix is not square (or the solver parameters are
//! invalid). After that, `solve` always succeeds: if the iteration cap is reached before the
//! tolerance, the last iterate is returned.
//!
//! ## Example Usage
//!
//! ```rust
//! use sparse_regular_inverse::{
//!     CgParams, RegularInverseOp, SparseRegularInverse, SymmetricView, Uplo,
//!     utils::generators::laplacian_2d,
//! };
//!
//! // A 100 x 100 SPD matrix with only its lower triangle stored.
//! let b = laplacian_2d(10, 0.5, Uplo::Lower);
//! let view = SymmetricView::new(b.as_ref(), Uplo::Lower);
//! let mut op = SparseRegularInverse::with_params(view, CgParams::default().with_tolerance(1e-10))
//!     .unwrap();
//!
//! let x: Vec<f64> = (0..op.rows()).map(|i| (i as f64 * 0.1).cos()).collect();
//! let mut bx = vec![0.0; op.rows()];
//! let mut x_back = vec![0.0; op.rows()];
//!
//! op.mat_prod(&x, &mut bx);
//! let info = op.solve_with_info(&bx, &mut x_back);
//!
//! assert!(info.converged);
//! let err = x.iter().zip(&x_back).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max);
//! assert!(err < 1e-8);
//! ```

pub mod algorithms;
pub mod error;
pub mod matrix;
pub mod solvers;
pub mod utils;

// Re-export the main API for convenient access.
pub use algorithms::{CgInfo, CgParams, Preconditioner};
pub use error::{MatOpError, MatOpErrorKind};
pub use matrix::{SymmetricView, Uplo};
pub use solvers::{RegularInverseOp, SparseRegularInverse};
