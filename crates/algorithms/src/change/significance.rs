//! Significant-change thresholding

use super::detect::ChangeResult;
use ndarray::{Array2, ArrayView2};

/// Share of a period's maximum absolute change below which change is
/// treated as insignificant
pub const SIGNIFICANCE_FRACTION: f64 = 0.1;

pub fn significance_threshold(max_difference: f64, fraction: f64) -> f64 {
    fraction * max_difference
}

/// Copy of an absolute-difference band with values below
/// `fraction * max_difference` set to zero.
pub fn significant_change(
    abs_band: ArrayView2<'_, f64>,
    max_difference: f64,
    fraction: f64,
) -> Array2<f64> {
    let threshold = significance_threshold(max_difference, fraction);
    abs_band.mapv(|v| if v < threshold { 0.0 } else { v })
}

/// Fraction of finite samples, over all bands, whose absolute change is
/// non-zero and reaches the significance threshold.
pub fn significant_fraction(result: &ChangeResult, fraction: f64) -> f64 {
    let total = result.valid_count;
    if total == 0 {
        return 0.0;
    }
    let threshold = significance_threshold(result.max_difference, fraction);
    let count = result
        .abs_difference
        .iter()
        .filter(|&&v| v.is_finite() && v > 0.0 && v >= threshold)
        .count();
    count as f64 / total as f64
}
