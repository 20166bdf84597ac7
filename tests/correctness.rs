//! Integration test suite to verify the regular-inverse operator against dense ground truth.
//!
//! # Test Methodology
//!
//! 1.  **Construct a Test Problem:** A sparse symmetric positive-definite matrix `B` is built
//!     with only one triangle stored, together with its full dense counterpart.
//! 2.  **Compute the Ground Truth:** The product `B x` is computed with a dense
//!     [`faer::Mat`] multiplication of the full matrix.
//! 3.  **Exercise the Operator:** `mat_prod` is compared to the dense product, and `solve` is
//!     checked through the round trip `solve(mat_prod(x)) = x`.
//! 4.  **Drive a Generalized Eigensolver:** A small inverse iteration written only against
//!     [`RegularInverseOp`] recovers a known generalized eigenvalue.

use anyhow::{Result, ensure};
use faer::{
    Mat,
    sparse::{SparseColMat, Triplet},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sparse_regular_inverse::{
    CgParams, MatOpErrorKind, RegularInverseOp, SparseRegularInverse, SymmetricView, Uplo,
    utils::generators::{laplacian_2d, tridiagonal},
};

/// Tolerance for comparisons against the dense product, which differ only by summation order.
const PRODUCT_TOLERANCE: f64 = 1e-12;

/// Tolerance for results that go through the conjugate gradient iteration.
const SOLVE_TOLERANCE: f64 = 1e-6;

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Rebuilds the full dense matrix from single-triangle sparse storage.
fn dense_from_triangle(b: &SparseColMat<usize, f64>) -> Mat<f64> {
    let n = b.nrows();
    let mut dense = Mat::<f64>::zeros(n, n);
    for t in b.triplet_iter() {
        dense.as_mut()[(t.row, t.col)] = *t.val;
        dense.as_mut()[(t.col, t.row)] = *t.val;
    }
    dense
}

/// A random SPD matrix: a random sparse symmetric pattern made strictly diagonally dominant.
fn create_random_spd_problem(n: usize, uplo: Uplo, seed: u64) -> SparseColMat<usize, f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triplets = Vec::new();
    let mut row_sums = vec![0.0; n];

    for j in 0..n {
        for i in (j + 1)..n {
            if rng.random::<f64>() < 0.2 {
                let val: f64 = rng.random::<f64>() - 0.5;
                row_sums[i] += val.abs();
                row_sums[j] += val.abs();
                let (row, col) = match uplo {
                    Uplo::Lower => (i, j),
                    Uplo::Upper => (j, i),
                };
                triplets.push(Triplet { row, col, val });
            }
        }
    }
    for (i, sum) in row_sums.iter().enumerate() {
        triplets.push(Triplet {
            row: i,
            col: i,
            val: sum + 1.0,
        });
    }
    SparseColMat::try_new_from_triplets(n, n, &triplets).unwrap()
}

fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect()
}

#[test]
fn test_mat_prod_matches_dense_product() -> Result<()> {
    let n = 60;
    for (uplo, seed) in [(Uplo::Lower, 1), (Uplo::Upper, 2)] {
        let b = create_random_spd_problem(n, uplo, seed);
        let dense = dense_from_triangle(&b);
        let op = SparseRegularInverse::new(b.as_ref(), uplo)?;

        let x = random_vector(n, 7);
        let x_mat = Mat::from_fn(n, 1, |i, _| x[i]);
        let expected = &dense * &x_mat;
        let expected: Vec<f64> = (0..n).map(|i| expected[(i, 0)]).collect();

        let mut y = vec![0.0; n];
        op.mat_prod(&x, &mut y);

        let err = max_abs_diff(&y, &expected);
        ensure!(err < PRODUCT_TOLERANCE, "{uplo:?}: product error too high: {err}");
    }
    Ok(())
}

#[test]
fn test_solve_inverts_mat_prod() -> Result<()> {
    let b = laplacian_2d(12, 0.2, Uplo::Upper);
    let mut op = SparseRegularInverse::new(b.as_ref(), Uplo::Upper)?;
    let n = op.rows();

    for seed in 0..3 {
        let x = random_vector(n, seed);
        let mut bx = vec![0.0; n];
        let mut x_back = vec![0.0; n];
        op.mat_prod(&x, &mut bx);
        op.solve(&bx, &mut x_back);

        let err = max_abs_diff(&x, &x_back);
        ensure!(err < SOLVE_TOLERANCE, "round-trip error too high: {err}");
    }
    Ok(())
}

#[test]
fn test_dimensions_are_stable_across_calls() -> Result<()> {
    let b = tridiagonal(17, 3.0, -1.0, Uplo::Lower);
    let mut op = SparseRegularInverse::new(b.as_ref(), Uplo::Lower)?;
    let x = random_vector(17, 3);
    let mut y = vec![0.0; 17];

    for _ in 0..3 {
        op.mat_prod(&x, &mut y);
        op.solve(&x, &mut y);
        ensure!(op.rows() == 17 && op.cols() == 17);
    }
    Ok(())
}

#[test]
fn test_non_square_matrix_is_rejected() {
    let triplets = [Triplet {
        row: 0usize,
        col: 0usize,
        val: 1.0,
    }];
    let b = SparseColMat::<usize, f64>::try_new_from_triplets(3, 4, &triplets).unwrap();

    let result = SparseRegularInverse::new(b.as_ref(), Uplo::Lower);
    assert!(matches!(
        result.as_ref().map_err(|e| e.kind()),
        Err(MatOpErrorKind::InvalidDimension { nrows: 3, ncols: 4 })
    ));
}

#[test]
fn test_identity_scenario() -> Result<()> {
    let b = tridiagonal(2, 1.0, 0.0, Uplo::Lower);
    let mut op = SparseRegularInverse::new(b.as_ref(), Uplo::Lower)?;

    let mut y = [0.0; 2];
    op.mat_prod(&[3.0, 5.0], &mut y);
    ensure!(y == [3.0, 5.0], "unexpected product {y:?}");

    op.solve(&[3.0, 5.0], &mut y);
    ensure!(max_abs_diff(&y, &[3.0, 5.0]) < SOLVE_TOLERANCE, "unexpected solve {y:?}");
    Ok(())
}

#[test]
fn test_two_by_two_lower_scenario() -> Result<()> {
    let triplets = [
        Triplet { row: 0usize, col: 0usize, val: 4.0 },
        Triplet { row: 1, col: 0, val: 1.0 },
        Triplet { row: 1, col: 1, val: 3.0 },
    ];
    let b = SparseColMat::<usize, f64>::try_new_from_triplets(2, 2, &triplets).unwrap();
    let mut op = SparseRegularInverse::new(b.as_ref(), Uplo::Lower)?;

    let mut y = [0.0; 2];
    op.mat_prod(&[1.0, 0.0], &mut y);
    ensure!(y == [4.0, 1.0], "unexpected product {y:?}");

    let mut x = [0.0; 2];
    op.solve(&[4.0, 1.0], &mut x);
    ensure!(max_abs_diff(&x, &[1.0, 0.0]) < SOLVE_TOLERANCE, "unexpected solve {x:?}");
    Ok(())
}

#[test]
fn test_repeated_solves_are_deterministic() -> Result<()> {
    let b = create_random_spd_problem(40, Uplo::Lower, 11);
    // A loose cap so the solve stops early and the scratch state is left mid-iteration.
    let params = CgParams::default().with_max_iterations(5);
    let mut op = SparseRegularInverse::with_params(SymmetricView::new(b.as_ref(), Uplo::Lower), params)?;

    let x = random_vector(40, 5);
    let mut first = vec![0.0; 40];
    let mut second = vec![0.0; 40];
    op.solve(&x, &mut first);
    op.solve(&random_vector(40, 6), &mut second);
    op.solve(&x, &mut second);

    ensure!(first == second, "repeated solves differ");
    Ok(())
}

#[test]
fn test_capped_solve_is_silent_approximation() -> Result<()> {
    let b = laplacian_2d(20, 0.0, Uplo::Lower);
    let params = CgParams::default().with_max_iterations(2);
    let mut op = SparseRegularInverse::with_params(SymmetricView::new(b.as_ref(), Uplo::Lower), params)?;
    let n = op.rows();

    let x = random_vector(n, 9);
    let mut y = vec![0.0; n];
    op.solve(&x, &mut y);

    let info = op.last_info().expect("solve records diagnostics");
    ensure!(!info.converged && info.iterations == 2, "unexpected info {info:?}");
    ensure!(y.iter().all(|v| v.is_finite()));
    Ok(())
}

/// Power iteration on `B^{-1} A` for `A = I`, written only against [`RegularInverseOp`].
///
/// The generalized eigenvalues of `(I, B)` are `1 / mu` for the eigenvalues `mu` of `B`, so the
/// iteration converges to `1 / mu_min`. Iterates are kept B-normalised.
fn largest_generalized_eigenvalue(op: &mut impl RegularInverseOp, iterations: usize) -> f64 {
    let n = op.rows();
    let mut x = vec![1.0; n];
    let mut y = vec![0.0; n];
    let mut bx = vec![0.0; n];
    let mut lambda = 0.0;

    for _ in 0..iterations {
        op.solve(&x, &mut y);
        // B-normalise: x = y / sqrt(y^T B y).
        op.mat_prod(&y, &mut bx);
        let b_norm = y.iter().zip(&bx).map(|(a, b)| a * b).sum::<f64>().sqrt();
        for (x_i, y_i) in x.iter_mut().zip(&y) {
            *x_i = y_i / b_norm;
        }
        // Rayleigh quotient x^T A x / x^T B x with x^T B x = 1.
        lambda = x.iter().map(|v| v * v).sum();
    }
    lambda
}

#[test]
fn test_drives_generalized_eigensolver() -> Result<()> {
    // B = tridiag(-1, 2 + s, -1) has eigenvalues 2 + s - 2 cos(k pi / (n + 1)).
    let n = 30;
    let shift = 0.5;
    let b = tridiagonal(n, 2.0 + shift, -1.0, Uplo::Upper);
    let params = CgParams::default().with_tolerance(1e-12);
    let mut op = SparseRegularInverse::with_params(SymmetricView::new(b.as_ref(), Uplo::Upper), params)?;

    let mu_min = 2.0 + shift - 2.0 * (std::f64::consts::PI / (n + 1) as f64).cos();
    let lambda = largest_generalized_eigenvalue(&mut op, 200);

    let rel_err = (lambda - 1.0 / mu_min).abs() * mu_min;
    ensure!(rel_err < 1e-8, "eigenvalue error too high: {rel_err}");
    Ok(())
}
