//! Raster data structures

mod element;
mod geotransform;
mod georef;
mod grid;

pub use element::RasterElement;
pub use geotransform::{BoundingBox, GeoTransform};
pub use georef::Georef;
pub use grid::Raster;
