//! # GeoDelta Core
//!
//! Core types and I/O for GeoDelta change detection.
//!
//! This crate provides:
//! - `Raster<T>`: band-major multi-band raster with georeferencing
//! - `GeoTransform`, `BoundingBox`, `CRS`: georeferencing metadata
//! - GeoTIFF reading and writing
//! - `RasterSeries`: date-keyed raster collections and the directory loader

pub mod crs;
pub mod error;
pub mod io;
pub mod maybe_rayon;
pub mod raster;
pub mod temporal;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{BoundingBox, GeoTransform, Georef, Raster, RasterElement};
pub use temporal::{DateSource, RasterSeries, TimedRaster};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::io::{load_series, read_geotiff, write_geotiff};
    pub use crate::raster::{BoundingBox, GeoTransform, Georef, Raster, RasterElement};
    pub use crate::temporal::{DateSource, RasterSeries, TimedRaster};
    pub use crate::Algorithm;
}

/// Core trait for GeoDelta processing steps.
///
/// Algorithms are pure functions from input to output controlled by
/// parameters; they log diagnostics but perform no other side effects.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
