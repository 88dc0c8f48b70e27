//! Heuristic volume change estimation
//!
//! Treats each pixel's signed difference as a height change and multiplies
//! it by the ground area of one pixel. This is an uncalibrated
//! approximation: pixel values are generally not heights, and no ground
//! truth is involved. Every [`VolumeEstimate`] carries `uncalibrated: true`.

use super::detect::{ChangeResult, ChangeSet};
use geodelta_core::raster::GeoTransform;
use geodelta_core::{Algorithm, Error, Result};
use serde::Serialize;
use tracing::info;

/// Parameters for volume estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeParams {
    /// Ground area of one pixel in squared length units (default 100,
    /// a 10 x 10 pixel)
    pub pixel_area: f64,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self { pixel_area: 100.0 }
    }
}

impl VolumeParams {
    pub fn new(pixel_area: f64) -> Self {
        Self { pixel_area }
    }

    /// Pixel area taken from a raster's affine transform
    pub fn from_transform(transform: &GeoTransform) -> Self {
        Self::new(transform.pixel_area())
    }

    /// Reject non-finite or non-positive pixel areas
    pub fn validate(&self) -> Result<()> {
        if !self.pixel_area.is_finite() || self.pixel_area <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "pixel_area",
                value: self.pixel_area.to_string(),
                reason: "must be a finite positive number".into(),
            });
        }
        Ok(())
    }
}

/// Added, removed and net volume for one period, in cubic units of the
/// pixel area's length unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeEstimate {
    pub period: String,
    /// Magnitude of the summed negative change
    pub material_removed: f64,
    /// Summed positive change
    pub material_added: f64,
    /// `material_added - material_removed`
    pub net_change: f64,
    pub pixel_area: f64,
    /// Always true: pixel values are assumed to be heights
    pub uncalibrated: bool,
}

/// Estimate volume change for a single period
pub fn estimate_volume(result: &ChangeResult, params: &VolumeParams) -> Result<VolumeEstimate> {
    params.validate()?;

    let mut removed = 0.0;
    let mut added = 0.0;
    for &diff in result.difference.iter() {
        let volume = diff * params.pixel_area;
        if volume < 0.0 {
            removed -= volume;
        } else if volume > 0.0 {
            added += volume;
        }
    }

    let estimate = VolumeEstimate {
        period: result.period(),
        material_removed: removed,
        material_added: added,
        net_change: added - removed,
        pixel_area: params.pixel_area,
        uncalibrated: true,
    };
    info!(
        "Volume estimate for {}: removed {:.2}, added {:.2}, net {:.2}",
        estimate.period, estimate.material_removed, estimate.material_added, estimate.net_change
    );
    Ok(estimate)
}

/// Estimate volume change for every period of a change set, in order
pub fn estimate_volumes(changes: &ChangeSet, params: VolumeParams) -> Result<Vec<VolumeEstimate>> {
    changes
        .iter()
        .map(|result| estimate_volume(result, &params))
        .collect()
}

/// Volume estimation algorithm
#[derive(Debug, Clone, Default)]
pub struct VolumeEstimator;

impl Algorithm for VolumeEstimator {
    type Input = ChangeSet;
    type Output = Vec<VolumeEstimate>;
    type Params = VolumeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "VolumeEstimator"
    }

    fn description(&self) -> &'static str {
        "Uncalibrated added/removed volume from signed differences and a per-pixel ground area"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        estimate_volumes(&input, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::compare_rasters;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use geodelta_core::temporal::{DateSource, TimedRaster};
    use geodelta_core::Raster;

    fn change(before: Vec<f64>, after: Vec<f64>) -> ChangeResult {
        let n = before.len();
        let d1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let earlier = TimedRaster::new(d1, DateSource::CompactSegment, Raster::from_vec(before, 1, 1, n).unwrap());
        let later = TimedRaster::new(d2, DateSource::CompactSegment, Raster::from_vec(after, 1, 1, n).unwrap());
        compare_rasters(&earlier, &later).unwrap()
    }

    #[test]
    fn single_pixel_removal() {
        let result = change(vec![5.0], vec![3.0]);
        let estimate = estimate_volume(&result, &VolumeParams::new(100.0)).unwrap();

        assert_eq!(estimate.material_removed, 200.0);
        assert_eq!(estimate.material_added, 0.0);
        assert_eq!(estimate.net_change, -200.0);
        assert!(estimate.uncalibrated);
        assert_eq!(estimate.period, "2023-01-01_to_2023-06-01");
    }

    #[test]
    fn mixed_changes() {
        let result = change(vec![1.0, 1.0, 1.0, 1.0], vec![3.0, 0.5, 1.0, 2.0]);
        let estimate = estimate_volume(&result, &VolumeParams::new(4.0)).unwrap();

        assert_relative_eq!(estimate.material_added, 12.0);
        assert_relative_eq!(estimate.material_removed, 2.0);
        assert_relative_eq!(estimate.net_change, 10.0);
    }

    #[test]
    fn default_pixel_area_is_ten_by_ten() {
        assert_eq!(VolumeParams::default().pixel_area, 100.0);
        let from_gt = VolumeParams::from_transform(&GeoTransform::new(0.0, 0.0, 30.0, -30.0));
        assert_relative_eq!(from_gt.pixel_area, 900.0);
    }

    #[test]
    fn invalid_pixel_area_is_rejected() {
        let result = change(vec![1.0], vec![2.0]);
        for area in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                estimate_volume(&result, &VolumeParams::new(area)),
                Err(Error::InvalidParameter { name: "pixel_area", .. })
            ));
        }
    }
}
