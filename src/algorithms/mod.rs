//! Iterative solvers for the inverse operation `y = B^{-1} x`.
//!
//! The [`cg`] module holds the conjugate gradient solver used by
//! [`crate::solvers::SparseRegularInverse`]. This module carries what the solver shares with
//! its callers: the parameter set [`CgParams`], the preconditioner choice, the per-solve
//! diagnostics [`CgInfo`], and the dense vector kernels the iteration is built from.

pub mod cg;

use crate::error::MatOpErrorKind;
use serde::{Deserialize, Serialize};

/// Preconditioner applied to the residual at every conjugate gradient step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preconditioner {
    /// No preconditioning, `M = I`.
    Identity,
    /// Diagonal scaling, `M = diag(B)`. Zero diagonal entries are left unscaled.
    #[default]
    Jacobi,
}

/// Configuration of the conjugate gradient iteration.
///
/// The defaults reproduce a plain diagonally preconditioned CG: the tolerance is machine
/// epsilon and the iteration cap is twice the problem dimension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CgParams {
    /// Relative residual `||b - B x|| / ||b||` below which the iteration stops.
    pub tolerance: f64,
    /// Maximum number of iterations. `None` means `2 * n`.
    pub max_iterations: Option<usize>,
    /// Preconditioner applied to every residual. Jacobi by default.
    pub preconditioner: Preconditioner,
}

impl Default for CgParams {
    fn default() -> Self {
        Self {
            tolerance: f64::EPSILON,
            max_iterations: None,
            preconditioner: Preconditioner::Jacobi,
        }
    }
}

impl CgParams {
    /// Sets the relative residual tolerance.
    ///
    /// # Arguments
    /// * `tolerance`: Must be finite and non-negative. Zero runs until the iteration cap or
    ///   until the residual underflows.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Caps the number of iterations, replacing the `2 * n` default.
    ///
    /// # Arguments
    /// * `max_iterations`: Must be at least 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Selects the preconditioner.
    pub fn with_preconditioner(mut self, preconditioner: Preconditioner) -> Self {
        self.preconditioner = preconditioner;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), MatOpErrorKind> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(MatOpErrorKind::InvalidParameter {
                name: "tolerance",
                reason: format!("must be finite and non-negative, got {}", self.tolerance),
            });
        }
        if self.max_iterations == Some(0) {
            return Err(MatOpErrorKind::InvalidParameter {
                name: "max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Diagnostics of a single solve.
///
/// A solve always produces a result; `converged == false` only means the result is the last
/// iterate rather than one within tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CgInfo {
    /// Number of matrix-vector products performed, including one that ended in a
    /// non-positive curvature.
    pub iterations: usize,
    /// `||b - B x|| / ||b||` for the returned `x`, zero for a zero right-hand side.
    pub relative_residual: f64,
    /// Whether `relative_residual` is within the tolerance. False for a NaN residual.
    pub converged: bool,
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub(crate) fn squared_norm(a: &[f64]) -> f64 {
    dot(a, a)
}

/// `y += alpha * x`
#[inline]
pub(crate) fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (y_i, x_i) in y.iter_mut().zip(x) {
        *y_i += alpha * x_i;
    }
}
