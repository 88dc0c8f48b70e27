//! # GeoDelta Algorithms
//!
//! Change analysis over raster time series.
//!
//! - **change**: consecutive-date differencing, summary statistics,
//!   significant-change thresholding and heuristic volume estimation

pub mod change;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{
        compare_rasters, detect_changes, estimate_volume, estimate_volumes, significant_change,
        ChangeDetector, ChangeResult, ChangeSet, DetectionStatus, VolumeEstimate,
        VolumeEstimator, VolumeParams,
    };
    pub use geodelta_core::prelude::*;
}
