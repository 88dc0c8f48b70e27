//! Georeferencing metadata attached to every raster

use super::{BoundingBox, GeoTransform};
use crate::crs::CRS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Georeferencing and layout metadata for a raster.
///
/// `width`, `height` and `band_count` describe the pixel array the metadata
/// belongs to; [`super::Raster`] refuses to pair them with an array of any
/// other shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Georef {
    pub transform: GeoTransform,
    pub crs: Option<CRS>,
    pub bounds: BoundingBox,
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    /// File the raster was decoded from, if any
    pub source: Option<PathBuf>,
}

impl Georef {
    /// Metadata for a `band_count × height × width` raster with the given transform
    pub fn new(transform: GeoTransform, band_count: usize, height: usize, width: usize) -> Self {
        Self {
            transform,
            crs: None,
            bounds: transform.bounds(width, height),
            width,
            height,
            band_count,
            source: None,
        }
    }

    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Array shape implied by this metadata: (bands, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.band_count, self.height, self.width)
    }
}
