//! Experiment runner for the product/solve round trip.
//!
//! For a sparse SPD matrix `B` (read from a MatrixMarket file or generated as a shifted 2D
//! Laplacian), this executable builds a single [`SparseRegularInverse`] and then, for a number
//! of random vectors `x`, computes `y = B x` and `z = B^{-1} y`. Each trial records the
//! relative round-trip error `||z - x|| / ||x||`, the conjugate gradient iteration count and
//! residual, and the wall time of both operations. Results are written as CSV.
//!
//! Only one operator is built for all trials; the construction time is logged separately so
//! the amortized cost of a solve can be read off the per-trial timings.

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use faer::sparse::SparseColMat;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use sparse_regular_inverse::{
    CgParams, Preconditioner, RegularInverseOp, SparseRegularInverse, SymmetricView, Uplo,
    utils::{data_loader::load_matrix_market, generators::laplacian_2d},
};
use std::{path::PathBuf, time::Instant};

/// Preconditioner choice on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PreconditionerArg {
    Identity,
    Jacobi,
}

impl From<PreconditionerArg> for Preconditioner {
    fn from(arg: PreconditionerArg) -> Self {
        match arg {
            PreconditionerArg::Identity => Preconditioner::Identity,
            PreconditionerArg::Jacobi => Preconditioner::Jacobi,
        }
    }
}

/// Command-line arguments for the round-trip experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "roundtrip",
    about = "Measures the accuracy and cost of B*x followed by B^-1*y on a sparse SPD matrix."
)]
struct RoundTripArgs {
    /// A symmetric MatrixMarket file. If omitted, a shifted 2D Laplacian is generated.
    #[clap(long, value_name = "PATH")]
    matrix: Option<PathBuf>,
    /// Grid size of the generated Laplacian (dimension is grid^2).
    #[clap(long, default_value_t = 64)]
    grid: usize,
    /// Diagonal shift of the generated Laplacian.
    #[clap(long, default_value_t = 0.1)]
    shift: f64,
    /// Relative residual tolerance of the conjugate gradient iteration. The library default,
    /// machine epsilon, is rarely reached within the iteration cap on large Laplacians.
    #[clap(long, default_value_t = 1e-10)]
    tolerance: f64,
    /// Iteration cap. Defaults to twice the dimension.
    #[clap(long)]
    max_iterations: Option<usize>,
    #[clap(long, value_enum, default_value_t = PreconditionerArg::Jacobi)]
    preconditioner: PreconditionerArg,
    /// Number of random vectors to push through the round trip.
    #[clap(long, default_value_t = 10)]
    trials: usize,
    /// Seed for the random vectors.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path to the output CSV file.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single row of the output CSV.
#[derive(Debug, Serialize)]
struct RoundTripResult {
    trial: usize,
    n: usize,
    iterations: usize,
    relative_residual: f64,
    converged: bool,
    relative_error: f64,
    mat_prod_time_s: f64,
    solve_time_s: f64,
}

fn norm_l2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = RoundTripArgs::parse();
    ensure!(args.trials > 0, "--trials must be at least 1");

    // 1. Obtain the matrix. Both sources store the lower triangle only.
    let b: SparseColMat<usize, f64> = match &args.matrix {
        Some(path) => load_matrix_market(path)
            .with_context(|| format!("Failed to load MatrixMarket file {path:?}"))?,
        None => {
            log::info!(
                "Generating a {0}x{0} Laplacian with shift {1}...",
                args.grid,
                args.shift
            );
            laplacian_2d(args.grid, args.shift, Uplo::Lower)
        }
    };

    // 2. Build the operator once.
    let mut params = CgParams::default()
        .with_tolerance(args.tolerance)
        .with_preconditioner(args.preconditioner.into());
    if let Some(max_iterations) = args.max_iterations {
        params = params.with_max_iterations(max_iterations);
    }
    let start_time = Instant::now();
    let mut op =
        SparseRegularInverse::with_params(SymmetricView::new(b.as_ref(), Uplo::Lower), params)
            .context("Failed to build the regular inverse operator")?;
    log::info!(
        "Built operator for n = {} ({} stored entries) in {:.3e} s.",
        op.rows(),
        op.view().nnz_stored(),
        start_time.elapsed().as_secs_f64()
    );

    // 3. Run the trials.
    let n = op.rows();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut bx = vec![0.0; n];
    let mut x_back = vec![0.0; n];
    let mut writer = csv::Writer::from_path(&args.output)?;

    for trial in 0..args.trials {
        let x: Vec<f64> = (0..n).map(|_| rng.random::<f64>() - 0.5).collect();

        let start_time = Instant::now();
        op.mat_prod(&x, &mut bx);
        let mat_prod_time_s = start_time.elapsed().as_secs_f64();

        let start_time = Instant::now();
        let info = op.solve_with_info(&bx, &mut x_back);
        let solve_time_s = start_time.elapsed().as_secs_f64();

        let diff: Vec<f64> = x.iter().zip(&x_back).map(|(a, b)| a - b).collect();
        let relative_error = norm_l2(&diff) / norm_l2(&x);

        if !info.converged {
            log::warn!(
                "Trial {trial}: cg stopped after {} iterations at relative residual {:.3e}.",
                info.iterations,
                info.relative_residual
            );
        }

        writer.serialize(RoundTripResult {
            trial,
            n,
            iterations: info.iterations,
            relative_residual: info.relative_residual,
            converged: info.converged,
            relative_error,
            mat_prod_time_s,
            solve_time_s,
        })?;
    }

    writer.flush()?;
    log::info!("Round-trip experiment complete. Results saved to {:?}.", &args.output);
    Ok(())
}
