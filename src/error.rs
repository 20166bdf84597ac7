//! This module defines the custom error types for the library.
//!
//! Building a [`crate::solvers::SparseRegularInverse`] is the only fallible step of the
//! operator's lifecycle, so every error in this module is a construction error. Once an
//! operator exists, `mat_prod` and `solve` cannot fail.
//!
//! Errors are built with [`thiserror`]: a public wrapper [`MatOpError`] around the
//! [`MatOpErrorKind`] enum, which callers can inspect through [`MatOpError::kind`].
use thiserror::Error;

/// Represents all possible errors that can occur while building a matrix operation.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct MatOpError(#[from] MatOpErrorKind);

impl MatOpError {
    /// Returns the kind of failure, so callers can tell the conditions apart.
    pub fn kind(&self) -> &MatOpErrorKind {
        &self.0
    }
}

/// The distinct kinds of construction failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatOpErrorKind {
    /// The supplied matrix is not square.
    #[error("Invalid dimension: matrix must be square, got {nrows} rows and {ncols} columns.")]
    InvalidDimension { nrows: usize, ncols: usize },

    /// A solver parameter is outside its legal range.
    #[error("Invalid solver parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl PartialEq for MatOpError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
