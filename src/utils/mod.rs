//! Common utilities for obtaining test matrices.
//!
//! This module provides helpers used by the experiment binary and the test suites.
//! It is organized into two submodules:
//!
//! - **`data_loader`**: Reads symmetric matrices in the MatrixMarket coordinate format, which
//!   stores the lower triangle only.
//!
//! - **`generators`**: Builds deterministic sparse symmetric positive-definite matrices
//!   (tridiagonal, 2D Laplacian) with a chosen stored triangle.
//!

pub mod data_loader;
pub mod generators;
