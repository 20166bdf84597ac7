//! Preconditioned conjugate gradient for symmetric positive-definite sparse systems.
//!
//! ** NOTE: We recommend using [`crate::solvers::SparseRegularInverse`] instead. This module is
//! intended for use cases where the solver is needed without the operator wrapper.
//!
//! [`ConjugateGradient`] is built in two phases. [`ConjugateGradient::compute`] validates the
//! matrix and the parameters and precomputes everything that depends only on `B` (the
//! preconditioner and the scratch vectors). [`ConjugateGradient::solve`] then runs the
//! iteration for one right-hand side, reusing that state, and never fails.
//!
//! ## Iteration
//!
//! ```text
//! x = 0, r = b
//! p = M^{-1} r, rz = r . p
//! repeat up to max_iterations:
//!     q = B p
//!     alpha = rz / (p . q)
//!     x += alpha p
//!     r -= alpha q
//!     stop if ||r||^2 < max(tol^2 ||b||^2, MIN_POSITIVE)
//!     z = M^{-1} r
//!     beta = (r . z) / rz, rz = r . z
//!     p = z + beta p
//! ```
//!
//! The iteration also stops if the curvature `p . q` is not strictly positive, which can only
//! happen when `B` is not positive definite or the residual has stagnated at round-off level.
//! A NaN curvature (from a NaN in `b` or in `B`) takes one step before stopping, so the NaN
//! shows up in `x`.

use super::{CgInfo, CgParams, Preconditioner, axpy, dot, squared_norm};
use crate::{
    error::{MatOpError, MatOpErrorKind},
    matrix::SymmetricView,
};
use faer::Index;

/// Solver state for repeated conjugate gradient solves against one matrix.
#[derive(Debug)]
pub struct ConjugateGradient<'a, I: Index> {
    mat: SymmetricView<'a, I>,
    params: CgParams,
    max_iterations: usize,
    /// `M^{-1}` as a diagonal.
    inv_diag: Vec<f64>,
    residual: Vec<f64>,
    direction: Vec<f64>,
    precond_residual: Vec<f64>,
    product: Vec<f64>,
    last_info: Option<CgInfo>,
}

impl<'a, I: Index> ConjugateGradient<'a, I> {
    /// Builds the solver state for `mat`.
    ///
    /// # Errors
    /// * [`MatOpErrorKind::InvalidDimension`] if `mat` is not square.
    /// * [`MatOpErrorKind::InvalidParameter`] if `params` is out of range.
    pub fn compute(mat: SymmetricView<'a, I>, params: CgParams) -> Result<Self, MatOpError> {
        let (nrows, ncols) = (mat.nrows(), mat.ncols());
        if nrows != ncols {
            return Err(MatOpErrorKind::InvalidDimension { nrows, ncols }.into());
        }
        params.validate()?;

        let n = nrows;
        let inv_diag = match params.preconditioner {
            Preconditioner::Identity => vec![1.0; n],
            Preconditioner::Jacobi => mat
                .diagonal()
                .into_iter()
                .map(|d| if d != 0.0 { 1.0 / d } else { 1.0 })
                .collect(),
        };

        Ok(Self {
            mat,
            params,
            max_iterations: params.max_iterations.unwrap_or(2 * n),
            inv_diag,
            residual: vec![0.0; n],
            direction: vec![0.0; n],
            precond_residual: vec![0.0; n],
            product: vec![0.0; n],
            last_info: None,
        })
    }

    /// Dimension of the square system.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inv_diag.len()
    }

    /// The parameters the solver was built with.
    #[inline]
    pub fn params(&self) -> &CgParams {
        &self.params
    }

    /// Relative residual tolerance.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.params.tolerance
    }

    /// The effective iteration cap, with the `2 * n` default resolved.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Diagnostics of the most recent [`ConjugateGradient::solve`], if any.
    #[inline]
    pub fn last_info(&self) -> Option<CgInfo> {
        self.last_info
    }

    /// Approximates `x = B^{-1} b`, starting from a zero initial guess.
    ///
    /// The result is written to `x` whether or not the iteration reached the tolerance;
    /// the returned [`CgInfo`] tells which. `b` and `x` must have length [`Self::dim`].
    pub fn solve(&mut self, b: &[f64], x: &mut [f64]) -> CgInfo {
        let n = self.dim();
        let b = &b[..n];
        let x = &mut x[..n];
        x.fill(0.0);

        let rhs_norm2 = squared_norm(b);
        if rhs_norm2 == 0.0 {
            return self.finish(CgInfo {
                iterations: 0,
                relative_residual: 0.0,
                converged: true,
            });
        }

        let tol = self.params.tolerance;
        let threshold = (tol * tol * rhs_norm2).max(f64::MIN_POSITIVE);

        self.residual.copy_from_slice(b);
        let mut residual_norm2 = rhs_norm2;
        let mut iterations = 0;

        // A NaN in `b` must reach `x` instead of skipping the iteration.
        if residual_norm2 >= threshold || residual_norm2.is_nan() {
            precondition(&self.inv_diag, &self.residual, &mut self.direction);
            let mut rz = dot(&self.residual, &self.direction);

            while iterations < self.max_iterations {
                self.mat.mat_vec(&self.direction, &mut self.product);
                iterations += 1;
                let curvature = dot(&self.direction, &self.product);
                if curvature <= 0.0 {
                    log::debug!("cg: non-positive curvature {curvature:e} at iteration {iterations}");
                    break;
                }

                let alpha = rz / curvature;
                axpy(alpha, &self.direction, x);
                axpy(-alpha, &self.product, &mut self.residual);
                residual_norm2 = squared_norm(&self.residual);

                if curvature.is_nan() || residual_norm2 < threshold {
                    break;
                }

                precondition(&self.inv_diag, &self.residual, &mut self.precond_residual);
                let rz_new = dot(&self.residual, &self.precond_residual);
                let beta = rz_new / rz;
                rz = rz_new;
                for (p, &z) in self.direction.iter_mut().zip(&self.precond_residual) {
                    *p = z + beta * *p;
                }
            }
        }

        let relative_residual = (residual_norm2 / rhs_norm2).sqrt();
        self.finish(CgInfo {
            iterations,
            relative_residual,
            converged: relative_residual <= tol,
        })
    }

    fn finish(&mut self, info: CgInfo) -> CgInfo {
        log::debug!(
            "cg: n = {}, {} iterations, relative residual {:.3e}, converged = {}",
            self.dim(),
            info.iterations,
            info.relative_residual,
            info.converged
        );
        self.last_info = Some(info);
        info
    }
}

/// `z = M^{-1} r` for a diagonal `M^{-1}`.
#[inline]
fn precondition(inv_diag: &[f64], r: &[f64], z: &mut [f64]) {
    for ((z_i, r_i), d_i) in z.iter_mut().zip(r).zip(inv_diag) {
        *z_i = r_i * d_i;
    }
}
