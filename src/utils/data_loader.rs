//! This module provides utilities for loading sparse symmetric matrices from files.
//!
//! It reads the MatrixMarket coordinate format restricted to symmetric real (or integer)
//! matrices. By definition such files list only the entries on or below the diagonal, which
//! is exactly the single-triangle storage [`crate::matrix::SymmetricView`] expects: the
//! loaded matrix is always used with [`crate::matrix::Uplo::Lower`].

use faer::sparse::{SparseColMat, Triplet};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

/// Represents all possible errors that can occur during data loading and parsing.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Occurs when a string cannot be parsed into an integer.
    #[error("Parse error: Failed to parse integer from '{0}'")]
    ParseInt(String),
    /// Occurs when a string cannot be parsed into a float.
    #[error("Parse error: Failed to parse float from '{0}'")]
    ParseFloat(String),
    /// Occurs if the `%%MatrixMarket` banner is missing or malformed.
    #[error("Format error: missing or malformed MatrixMarket header '{0}'.")]
    BadHeader(String),
    /// The file is valid MatrixMarket but not a symmetric real coordinate matrix.
    #[error("Format error: unsupported matrix kind '{0}', expected 'coordinate real symmetric'.")]
    Unsupported(String),
    /// Occurs when the end of a file is reached unexpectedly during parsing.
    #[error("Format error: Unexpected end of file while reading data.")]
    UnexpectedEof,
    /// An entry lies outside the declared dimensions.
    #[error("Format error: entry ({row}, {col}) is outside a {nrows}x{ncols} matrix.")]
    OutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// A symmetric file listed an entry above the diagonal.
    #[error("Format error: entry ({row}, {col}) lies above the diagonal of a symmetric matrix.")]
    UpperTriangleEntry { row: usize, col: usize },
    /// Occurs if the number of entries read does not match the size line.
    #[error("Dimension mismatch: size line declares {declared} entries, but {found} were read.")]
    EntryCountMismatch { declared: usize, found: usize },
    /// Occurs if the sparse matrix construction fails internally.
    #[error("Internal error: Failed to construct the sparse matrix from triplets.")]
    SparseMatrixConstructionError,
}

fn parse_usize(token: Option<&str>) -> Result<usize, DataLoaderError> {
    let token = token.ok_or(DataLoaderError::UnexpectedEof)?;
    token
        .parse::<usize>()
        .map_err(|_| DataLoaderError::ParseInt(token.to_string()))
}

fn parse_f64(token: Option<&str>) -> Result<f64, DataLoaderError> {
    let token = token.ok_or(DataLoaderError::UnexpectedEof)?;
    token
        .parse::<f64>()
        .map_err(|_| DataLoaderError::ParseFloat(token.to_string()))
}

/// Validates the `%%MatrixMarket matrix coordinate real symmetric` banner.
fn check_header(line: &str) -> Result<(), DataLoaderError> {
    let parts: Vec<String> = line.split_whitespace().map(str::to_lowercase).collect();
    if parts.len() != 5 || parts[0] != "%%matrixmarket" || parts[1] != "matrix" {
        return Err(DataLoaderError::BadHeader(line.to_string()));
    }
    let supported = parts[2] == "coordinate"
        && (parts[3] == "real" || parts[3] == "integer")
        && parts[4] == "symmetric";
    if !supported {
        return Err(DataLoaderError::Unsupported(parts[2..].join(" ")));
    }
    Ok(())
}

/// Parses a symmetric MatrixMarket matrix from any buffered reader.
///
/// # Returns
/// The lower triangle of the matrix in sparse column format, 0-based.
pub fn parse_matrix_market(reader: impl BufRead) -> Result<SparseColMat<usize, f64>, DataLoaderError> {
    let mut lines = reader.lines();

    let header = lines.next().ok_or(DataLoaderError::UnexpectedEof)??;
    check_header(&header)?;

    // Skip comments and blank lines up to the size line.
    let size_line = loop {
        let line = lines.next().ok_or(DataLoaderError::UnexpectedEof)??;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('%') {
            break line;
        }
    };
    let mut parts = size_line.split_whitespace();
    let nrows = parse_usize(parts.next())?;
    let ncols = parse_usize(parts.next())?;
    let declared = parse_usize(parts.next())?;

    let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(declared);
    for line in lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }

        // Indices in MatrixMarket are 1-based, so we convert them to 0-based.
        let mut parts = trimmed.split_whitespace();
        let row = parse_usize(parts.next())?;
        let col = parse_usize(parts.next())?;
        let val = parse_f64(parts.next())?;
        if row == 0 || col == 0 || row > nrows || col > ncols {
            return Err(DataLoaderError::OutOfBounds {
                row,
                col,
                nrows,
                ncols,
            });
        }
        if row < col {
            return Err(DataLoaderError::UpperTriangleEntry { row, col });
        }
        triplets.push(Triplet {
            row: row - 1,
            col: col - 1,
            val,
        });
    }

    if triplets.len() != declared {
        return Err(DataLoaderError::EntryCountMismatch {
            declared,
            found: triplets.len(),
        });
    }

    SparseColMat::try_new_from_triplets(nrows, ncols, &triplets)
        .map_err(|_| DataLoaderError::SparseMatrixConstructionError)
}

/// Loads a symmetric MatrixMarket file. See [`parse_matrix_market`].
pub fn load_matrix_market(path: impl AsRef<Path>) -> Result<SparseColMat<usize, f64>, DataLoaderError> {
    let file = File::open(path)?;
    parse_matrix_market(BufReader::new(file))
}
