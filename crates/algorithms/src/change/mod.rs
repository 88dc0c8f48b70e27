//! Temporal change analysis
//!
//! - **detect**: consecutive-date differencing and summary statistics
//! - **volume**: heuristic added/removed volume from signed differences
//! - **significance**: thresholding of absolute change

mod detect;
mod significance;
mod volume;

pub use detect::{
    compare_rasters, detect_changes, period_key, ChangeDetector, ChangeResult, ChangeSet,
    DetectionStatus, SkipReason, SkippedPair, PERCENT_EPSILON,
};
pub use significance::{
    significance_threshold, significant_change, significant_fraction, SIGNIFICANCE_FRACTION,
};
pub use volume::{estimate_volume, estimate_volumes, VolumeEstimate, VolumeEstimator, VolumeParams};
