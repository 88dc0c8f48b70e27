//! Field-to-RGBA rendering using color schemes.

use crate::scheme::{evaluate, ColorScheme, Rgb};
use ndarray::ArrayView2;

/// Parameters for colormap rendering.
#[derive(Debug, Clone)]
pub struct ColormapParams {
    /// Color scheme to use.
    pub scheme: ColorScheme,
    /// Minimum value for normalization. Values below this are clamped.
    pub min: f64,
    /// Maximum value for normalization. Values above this are clamped.
    pub max: f64,
    /// Color for NaN pixels (RGBA). Default: fully transparent.
    pub nodata_color: [u8; 4],
}

impl ColormapParams {
    /// Create params with explicit min/max range.
    pub fn with_range(scheme: ColorScheme, min: f64, max: f64) -> Self {
        Self {
            scheme,
            min,
            max,
            nodata_color: [0, 0, 0, 0],
        }
    }

    /// Normalized position of `value` within the range.
    ///
    /// A degenerate range maps everything relative to `min` with unit width.
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        let inv_range = if range.abs() > f64::EPSILON {
            1.0 / range
        } else {
            1.0
        };
        (value - self.min) * inv_range
    }

    /// RGBA color for a single value.
    pub fn color_of(&self, value: f64) -> [u8; 4] {
        if !value.is_finite() {
            return self.nodata_color;
        }
        let Rgb { r, g, b } = evaluate(self.scheme, self.normalize(value));
        [r, g, b, 255]
    }
}

/// Convert a 2-D field to an RGBA pixel buffer.
///
/// Returns a `Vec<u8>` of length `rows * cols * 4` in row-major order.
/// NaN and infinite values are rendered with `params.nodata_color`.
pub fn field_to_rgba(field: ArrayView2<'_, f64>, params: &ColormapParams) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(field.len() * 4);
    for &val in field.iter() {
        rgba.extend_from_slice(&params.color_of(val));
    }
    rgba
}
