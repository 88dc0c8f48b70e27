//! Side-by-side panel composites with color-scale strips.
//!
//! Panels are resampled (nearest neighbour) so their longest side lies
//! between [`MIN_PANEL_SIDE`] and [`MAX_PANEL_SIDE`], which keeps the canvas
//! bounded for full-resolution scenes.
//!
//! Only pixels are drawn: panel labels and the numeric range of each
//! color-scale strip are not rendered as text. They stay available on
//! [`Panel`] and are logged when a change map is saved.

use crate::error::{RenderError, Result};
use crate::render::{field_to_rgba, ColormapParams};
use crate::scheme::{evaluate, Rgb};
use image::{Rgba, RgbaImage};
use ndarray::{Array2, ArrayView2};

/// Outer border around the composite, in pixels.
pub const MARGIN: u32 = 16;
/// Horizontal gap between panels.
pub const PANEL_GAP: u32 = 24;
/// Vertical gap between a panel and its color-scale strip.
pub const BAR_GAP: u32 = 8;
/// Height of the color-scale strip.
pub const BAR_HEIGHT: u32 = 16;
/// Panels smaller than this along their longest side are upscaled
/// by an integer factor.
pub const MIN_PANEL_SIDE: usize = 256;
/// Panels larger than this along their longest side are downsampled
/// by an integer step.
pub const MAX_PANEL_SIDE: usize = 2048;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// One field of a composite together with how to color it.
#[derive(Debug, Clone)]
pub struct Panel {
    pub field: Array2<f64>,
    pub params: ColormapParams,
    pub label: String,
}

impl Panel {
    pub fn new(field: Array2<f64>, params: ColormapParams, label: impl Into<String>) -> Self {
        Self {
            field,
            params,
            label: label.into(),
        }
    }
}

/// Displayed size of a `rows` x `cols` field.
pub fn panel_size(rows: usize, cols: usize) -> (usize, usize) {
    let side = rows.max(cols).max(1);
    if side < MIN_PANEL_SIDE {
        let scale = MIN_PANEL_SIDE.div_ceil(side);
        (rows * scale, cols * scale)
    } else if side > MAX_PANEL_SIDE {
        let step = side.div_ceil(MAX_PANEL_SIDE);
        (rows.div_ceil(step), cols.div_ceil(step))
    } else {
        (rows, cols)
    }
}

/// Nearest-neighbour resample of a field to `rows` x `cols`.
pub fn resample_nearest(field: ArrayView2<'_, f64>, rows: usize, cols: usize) -> Array2<f64> {
    let (src_rows, src_cols) = field.dim();
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        field[[r * src_rows / rows, c * src_cols / cols]]
    })
}

fn to_u32(value: usize, width: usize, height: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| RenderError::TooLarge { width, height })
}

/// Render panels side by side, each with a color-scale strip beneath it.
///
/// # Errors
/// - `RenderError::NoPanels` for an empty slice
/// - `RenderError::EmptyField` when the shared shape has no pixels
/// - `RenderError::ShapeMismatch` when panels differ in shape
pub fn render_composite(panels: &[Panel]) -> Result<RgbaImage> {
    let first = panels.first().ok_or(RenderError::NoPanels)?;
    let (rows, cols) = first.field.dim();
    if rows == 0 || cols == 0 {
        return Err(RenderError::EmptyField);
    }
    if let Some(other) = panels.iter().find(|p| p.field.dim() != (rows, cols)) {
        return Err(RenderError::ShapeMismatch {
            expected: (rows, cols),
            actual: other.field.dim(),
        });
    }

    let (panel_h, panel_w) = panel_size(rows, cols);
    let n = panels.len();
    let width = 2 * MARGIN as usize + n * panel_w + (n - 1) * PANEL_GAP as usize;
    let height = 2 * MARGIN as usize + panel_h + (BAR_GAP + BAR_HEIGHT) as usize;

    let mut img = RgbaImage::from_pixel(
        to_u32(width, width, height)?,
        to_u32(height, width, height)?,
        BACKGROUND,
    );

    let (out_rows, out_cols) = (panel_h, panel_w);
    let panel_w = to_u32(panel_w, width, height)?;
    let panel_h = to_u32(panel_h, width, height)?;

    for (i, panel) in panels.iter().enumerate() {
        let x0 = MARGIN + i as u32 * (panel_w + PANEL_GAP);
        let display = resample_nearest(panel.field.view(), out_rows, out_cols);
        draw_field(&mut img, &display, &panel.params, x0, MARGIN);
        draw_scale_strip(&mut img, &panel.params, x0, MARGIN + panel_h + BAR_GAP, panel_w);
    }

    Ok(img)
}

fn draw_field(
    img: &mut RgbaImage,
    field: &Array2<f64>,
    params: &ColormapParams,
    x0: u32,
    y0: u32,
) {
    let cols = field.ncols();
    let rgba = field_to_rgba(field.view(), params);
    for (i, px) in rgba.chunks_exact(4).enumerate() {
        let (r, c) = (i / cols, i % cols);
        img.put_pixel(x0 + c as u32, y0 + r as u32, Rgba([px[0], px[1], px[2], px[3]]));
    }
}

fn draw_scale_strip(img: &mut RgbaImage, params: &ColormapParams, x0: u32, y0: u32, width: u32) {
    for dx in 0..width {
        let t = if width > 1 {
            dx as f64 / (width - 1) as f64
        } else {
            0.5
        };
        let Rgb { r, g, b } = evaluate(params.scheme, t);
        for dy in 0..BAR_HEIGHT {
            img.put_pixel(x0 + dx, y0 + dy, Rgba([r, g, b, 255]));
        }
    }
}
