//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{Georef, GeoTransform, RasterElement};
use ndarray::{Array3, Axis};

/// A georeferenced multi-band raster.
///
/// Pixels are stored band-major as `(band, row, col)`. The array shape
/// always agrees with `georef.band_count`, `georef.height` and
/// `georef.width`.
///
/// # Example
///
/// ```ignore
/// use geodelta_core::Raster;
///
/// let raster: Raster<u16> = Raster::new(3, 100, 200);
/// assert_eq!(raster.shape(), (3, 100, 200));
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array3<T>,
    georef: Georef,
}

impl<T: RasterElement> Raster<T> {
    /// Create a zero-filled raster with a default transform
    pub fn new(bands: usize, rows: usize, cols: usize) -> Self {
        Self {
            data: Array3::zeros((bands, rows, cols)),
            georef: Georef::new(GeoTransform::default(), bands, rows, cols),
        }
    }

    /// Create a raster filled with a single value
    pub fn filled(bands: usize, rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array3::from_elem((bands, rows, cols), value),
            georef: Georef::new(GeoTransform::default(), bands, rows, cols),
        }
    }

    /// Pair a pixel array with its metadata, checking that the shapes agree
    pub fn from_parts(data: Array3<T>, georef: Georef) -> Result<Self> {
        if data.dim() != georef.shape() {
            return Err(Error::ShapeMismatch {
                expected: georef.shape(),
                actual: data.dim(),
            });
        }
        Ok(Self { data, georef })
    }

    /// Create a raster from an array with a default transform
    pub fn from_array(data: Array3<T>) -> Self {
        let (bands, rows, cols) = data.dim();
        Self {
            data,
            georef: Georef::new(GeoTransform::default(), bands, rows, cols),
        }
    }

    /// Create a raster from band-major samples
    pub fn from_vec(data: Vec<T>, bands: usize, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != bands * rows * cols {
            return Err(Error::InvalidDimensions {
                bands,
                width: cols,
                height: rows,
            });
        }
        let array = Array3::from_shape_vec((bands, rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    // Dimensions

    /// Number of bands
    pub fn bands(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Dimensions as (bands, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Total number of samples across all bands
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Sample at (band, row, col)
    pub fn get(&self, band: usize, row: usize, col: usize) -> Option<T> {
        self.data.get((band, row, col)).copied()
    }

    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    /// Samples promoted to `f64`
    pub fn to_f64(&self) -> Array3<f64> {
        self.data.mapv(|v| v.to_f64())
    }

    // Metadata

    pub fn georef(&self) -> &Georef {
        &self.georef
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.georef.transform
    }

    /// Replace the transform, keeping the bounding box in sync
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.georef.transform = transform;
        self.georef.bounds = transform.bounds(self.cols(), self.rows());
    }

    pub fn set_crs(&mut self, crs: Option<crate::CRS>) {
        self.georef.crs = crs;
    }
}
