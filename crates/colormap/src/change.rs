//! Change-map rendering for detection results.

use std::fs;
use std::path::{Path, PathBuf};

use geodelta_algorithms::change::{significant_change, ChangeResult, SIGNIFICANCE_FRACTION};
use ndarray::{Array2, Array3, ArrayView2};
use tracing::{debug, info};

use crate::composite::{render_composite, Panel};
use crate::error::{RenderError, Result};
use crate::render::ColormapParams;
use crate::scheme::ColorScheme;

/// Fixed display range of the raw and absolute difference panels.
pub const DIFFERENCE_DISPLAY_LIMIT: f64 = 500.0;

fn first_band(data: &Array3<f64>) -> Result<ArrayView2<'_, f64>> {
    data.outer_iter().next().ok_or(RenderError::EmptyField)
}

/// The three panels of a change map, built from band 0 only.
///
/// 1. signed difference, RdBu over ±500
/// 2. absolute difference, Hot over 0..500
/// 3. absolute difference with insignificant change zeroed, Hot over
///    0..max_difference
pub fn change_panels(result: &ChangeResult) -> Result<Vec<Panel>> {
    let difference = first_band(&result.difference)?;
    let abs_difference = first_band(&result.abs_difference)?;
    let significant: Array2<f64> =
        significant_change(abs_difference, result.max_difference, SIGNIFICANCE_FRACTION);

    Ok(vec![
        Panel::new(
            difference.to_owned(),
            ColormapParams::with_range(
                ColorScheme::RdBu,
                -DIFFERENCE_DISPLAY_LIMIT,
                DIFFERENCE_DISPLAY_LIMIT,
            ),
            "Raw Difference",
        ),
        Panel::new(
            abs_difference.to_owned(),
            ColormapParams::with_range(ColorScheme::Hot, 0.0, DIFFERENCE_DISPLAY_LIMIT),
            "Absolute Difference",
        ),
        Panel::new(
            significant,
            ColormapParams::with_range(ColorScheme::Hot, 0.0, result.max_difference),
            "Significant Changes",
        ),
    ])
}

/// File name of the change map for a result.
pub fn change_map_name(result: &ChangeResult) -> String {
    format!("change_{}.png", result.period())
}

/// Render and save the change map of one result into `output_dir`.
///
/// The directory is created if absent. Returns the written path.
pub fn save_change_map(result: &ChangeResult, output_dir: &Path) -> Result<PathBuf> {
    let panels = change_panels(result)?;
    let img = render_composite(&panels)?;

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(change_map_name(result));
    img.save(&path)?;

    for panel in &panels {
        debug!(
            "{} panel: {} over [{}, {}]",
            panel.label,
            panel.params.scheme.name(),
            panel.params.min,
            panel.params.max
        );
    }
    info!("Saved change visualization to {}", path.display());
    Ok(path)
}
