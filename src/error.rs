//! Error types for the trunk detection pipeline.

use thiserror::Error;

/// Main error type. Everything surfaces to the caller and terminates the
/// run; there is no retry or partial-result recovery anywhere.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open '{path}': {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot create '{path}': {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("unsupported pixel format in '{0}'")]
    UnsupportedPixelFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}' in input CSV")]
    MissingColumn(String),

    #[error("non-numeric value '{value}' in column '{column}', line {line}")]
    NonNumeric {
        column: String,
        value: String,
        line: u64,
    },

    #[error("coordinate columns have mismatched lengths: x={x}, y={y}, z={z}")]
    LengthMismatch { x: usize, y: usize, z: usize },

    #[error(
        "point {index} projects outside the terrain grid: (row {row}, col {col}), grid is {nrow}x{ncol}"
    )]
    OutsideGrid {
        index: usize,
        row: f64,
        col: f64,
        nrow: usize,
        ncol: usize,
    },

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("clustering error: {0}")]
    Cluster(String),
}

/// Result type alias for the whole crate.
pub type Result<T> = std::result::Result<T, Error>;
