//! Error types for GeoDelta

use thiserror::Error;

/// Main error type for GeoDelta operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {bands} bands of {width}x{height}")]
    InvalidDimensions {
        bands: usize,
        width: usize,
        height: usize,
    },

    #[error("Raster shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Raster has no pixels")]
    EmptyRaster,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for GeoDelta operations
pub type Result<T> = std::result::Result<T, Error>;
