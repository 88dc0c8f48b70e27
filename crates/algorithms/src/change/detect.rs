//! Change detection between consecutive rasters of a series
//!
//! Every adjacent pair of dates `(earlier, later)` with identical shapes
//! produces a [`ChangeResult`]:
//!
//! ```text
//! difference        = later - earlier
//! abs_difference    = |difference|
//! percentage_change = difference / (earlier + ε) * 100
//! ```
//!
//! Samples are promoted to `f64` before subtracting. The ε term keeps the
//! percentage finite where `earlier` is exactly zero; near-zero baselines
//! still yield very large percentages.
//!
//! NaN or infinite samples in either raster (float nodata) stay NaN/infinite
//! in the per-pixel arrays but are left out of the summary statistics:
//! total, mean and max cover only the finite samples, and the mean divides
//! by [`ChangeResult::valid_count`]. With no finite samples all three are 0.

use chrono::NaiveDate;
use geodelta_core::maybe_rayon::*;
use geodelta_core::raster::{Georef, RasterElement};
use geodelta_core::temporal::{RasterSeries, TimedRaster};
use geodelta_core::{Algorithm, Error, Result};
use ndarray::{Array3, Zip};
use serde::Serialize;
use tracing::{info, warn};

/// Added to the baseline before dividing in `percentage_change`
pub const PERCENT_EPSILON: f64 = 1e-10;

/// Key naming the period between two dates: `"{from}_to_{to}"`
pub fn period_key(from: NaiveDate, to: NaiveDate) -> String {
    format!("{}_to_{}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
}

/// Per-pixel change between two dates
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeResult {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// `later - earlier`, band-major
    pub difference: Array3<f64>,
    pub abs_difference: Array3<f64>,
    pub percentage_change: Array3<f64>,
    /// Sum of the finite values of `abs_difference`
    pub total_difference: f64,
    /// `total_difference / valid_count`
    pub mean_difference: f64,
    /// Maximum of the finite values of `abs_difference`
    pub max_difference: f64,
    /// Number of samples with a finite difference
    pub valid_count: usize,
    /// Georeferencing of the earlier raster
    pub georef: Georef,
}

impl ChangeResult {
    pub fn period(&self) -> String {
        period_key(self.from, self.to)
    }

    /// Shape of the difference arrays as (bands, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.difference.dim()
    }
}

/// Why an adjacent pair produced no result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    ShapeMismatch {
        earlier: (usize, usize, usize),
        later: (usize, usize, usize),
    },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPair {
    pub period: String,
    pub reason: SkipReason,
}

/// Whether a comparison was attempted at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionStatus {
    Compared,
    /// Fewer than two rasters were available
    InsufficientData { available: usize },
}

/// Ordered results of [`detect_changes`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    status: DetectionStatus,
    results: Vec<ChangeResult>,
    skipped: Vec<SkippedPair>,
}

impl ChangeSet {
    fn insufficient(available: usize) -> Self {
        Self {
            status: DetectionStatus::InsufficientData { available },
            results: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn status(&self) -> DetectionStatus {
        self.status
    }

    /// True when fewer than two rasters were supplied
    pub fn is_insufficient(&self) -> bool {
        matches!(self.status, DetectionStatus::InsufficientData { .. })
    }

    /// Results in ascending date order
    pub fn results(&self) -> &[ChangeResult] {
        &self.results
    }

    pub fn skipped(&self) -> &[SkippedPair] {
        &self.skipped
    }

    /// Result for a `"{from}_to_{to}"` key
    pub fn get(&self, period: &str) -> Option<&ChangeResult> {
        self.results.iter().find(|r| r.period() == period)
    }

    /// Period keys in result order
    pub fn periods(&self) -> Vec<String> {
        self.results.iter().map(ChangeResult::period).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeResult;
    type IntoIter = std::slice::Iter<'a, ChangeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Compare two dated rasters.
///
/// # Errors
/// - `Error::ShapeMismatch` when the pixel arrays differ in shape
/// - `Error::EmptyRaster` when there are no pixels to summarize
pub fn compare_rasters<T: RasterElement>(
    earlier: &TimedRaster<T>,
    later: &TimedRaster<T>,
) -> Result<ChangeResult> {
    let (before, after) = (&earlier.raster, &later.raster);
    if before.shape() != after.shape() {
        return Err(Error::ShapeMismatch {
            expected: before.shape(),
            actual: after.shape(),
        });
    }
    if before.is_empty() {
        return Err(Error::EmptyRaster);
    }
    if let (Some(a), Some(b)) = (&before.georef().crs, &after.georef().crs) {
        if !a.is_equivalent(b) {
            warn!(
                "CRS differs between {} ({}) and {} ({}); comparing pixel grids as-is",
                earlier.date, a, later.date, b
            );
        }
    }

    let before = before.to_f64();
    let difference = after.to_f64() - &before;
    let abs_difference = difference.mapv(f64::abs);

    let mut percentage_change = Array3::zeros(difference.dim());
    Zip::from(&mut percentage_change)
        .and(&difference)
        .and(&before)
        .for_each(|pct, &diff, &base| *pct = diff / (base + PERCENT_EPSILON) * 100.0);

    let (valid_count, total_difference, max_difference) = abs_difference
        .iter()
        .filter(|v| v.is_finite())
        .fold((0usize, 0.0, 0.0_f64), |(n, sum, max), &v| {
            (n + 1, sum + v, max.max(v))
        });
    if valid_count < abs_difference.len() {
        warn!(
            "{} of {} samples between {} and {} are not finite; excluded from statistics",
            abs_difference.len() - valid_count,
            abs_difference.len(),
            earlier.date,
            later.date
        );
    }
    let mean_difference = if valid_count > 0 {
        total_difference / valid_count as f64
    } else {
        0.0
    };

    Ok(ChangeResult {
        from: earlier.date,
        to: later.date,
        difference,
        abs_difference,
        percentage_change,
        total_difference,
        mean_difference,
        max_difference,
        valid_count,
        georef: earlier.raster.georef().clone(),
    })
}

/// Compute changes between every pair of consecutive dates.
///
/// Pairs are visited in ascending date order and results keep that order.
/// A pair whose shapes differ, or whose computation fails, is logged,
/// recorded in [`ChangeSet::skipped`] and does not affect the other pairs.
/// With fewer than two rasters the set is empty and its status is
/// [`DetectionStatus::InsufficientData`].
pub fn detect_changes<T: RasterElement>(series: &RasterSeries<T>) -> ChangeSet {
    if series.len() < 2 {
        warn!(
            "Need at least two images to compare, found {}; comparison skipped",
            series.len()
        );
        return ChangeSet::insufficient(series.len());
    }

    let outcomes: Vec<_> = series
        .adjacent_pairs()
        .into_par_iter()
        .map(|(earlier, later)| {
            (
                period_key(earlier.date, later.date),
                compare_rasters(earlier, later),
            )
        })
        .collect();

    let mut set = ChangeSet {
        status: DetectionStatus::Compared,
        results: Vec::with_capacity(outcomes.len()),
        skipped: Vec::new(),
    };

    for (period, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!(
                    "Comparison {}: total absolute change {}, mean {}, max {}",
                    period,
                    result.total_difference,
                    result.mean_difference,
                    result.max_difference
                );
                set.results.push(result);
            }
            Err(Error::ShapeMismatch { expected, actual }) => {
                warn!(
                    "Images for {} have different shapes: {:?} vs {:?}; pair skipped",
                    period, expected, actual
                );
                set.skipped.push(SkippedPair {
                    period,
                    reason: SkipReason::ShapeMismatch {
                        earlier: expected,
                        later: actual,
                    },
                });
            }
            Err(e) => {
                warn!("Comparison {} failed: {}; pair skipped", period, e);
                set.skipped.push(SkippedPair {
                    period,
                    reason: SkipReason::Failed(e.to_string()),
                });
            }
        }
    }

    set
}

/// Change detection algorithm
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector;

impl Algorithm for ChangeDetector {
    type Input = RasterSeries<f64>;
    type Output = ChangeSet;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "ChangeDetector"
    }

    fn description(&self) -> &'static str {
        "Per-pixel difference, absolute difference and percentage change between consecutive dates"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        Ok(detect_changes(&input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geodelta_core::temporal::DateSource;
    use geodelta_core::Raster;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn timed(d: &str, raster: Raster<f64>) -> TimedRaster<f64> {
        TimedRaster::new(date(d), DateSource::IsoSegment, raster)
    }

    fn ramp(bands: usize, rows: usize, cols: usize, scale: f64) -> Raster<f64> {
        let data = (0..bands * rows * cols).map(|v| v as f64 * scale).collect();
        Raster::from_vec(data, bands, rows, cols).unwrap()
    }

    #[test]
    fn difference_statistics() {
        let earlier = timed("2023-01-01", Raster::from_vec(vec![1.0, 5.0, 2.0, 8.0], 1, 2, 2).unwrap());
        let later = timed("2023-02-01", Raster::from_vec(vec![4.0, 1.0, 2.0, 9.0], 1, 2, 2).unwrap());

        let result = compare_rasters(&earlier, &later).unwrap();

        assert_eq!(result.difference.iter().copied().collect::<Vec<_>>(), [3.0, -4.0, 0.0, 1.0]);
        assert_eq!(result.abs_difference.iter().copied().collect::<Vec<_>>(), [3.0, 4.0, 0.0, 1.0]);
        assert_relative_eq!(result.total_difference, 8.0);
        assert_relative_eq!(result.mean_difference, 2.0);
        assert_relative_eq!(result.max_difference, 4.0);
        assert_relative_eq!(result.percentage_change[[0, 0, 0]], 300.0, epsilon = 1e-6);
        assert_relative_eq!(result.percentage_change[[0, 0, 1]], -80.0, epsilon = 1e-6);
        assert_eq!(result.period(), "2023-01-01_to_2023-02-01");
    }

    #[test]
    fn identities_hold_for_multiband_input() {
        let earlier = timed("2023-01-01", ramp(3, 4, 5, 1.0));
        let later = timed("2023-01-02", ramp(3, 4, 5, -0.5));
        let result = compare_rasters(&earlier, &later).unwrap();

        Zip::from(&result.difference)
            .and(&result.abs_difference)
            .and(earlier.raster.data())
            .and(later.raster.data())
            .for_each(|&d, &a, &e, &l| {
                assert_eq!(d, l - e);
                assert_eq!(a, d.abs());
                assert!(result.max_difference >= a);
            });
        assert_relative_eq!(result.total_difference, result.abs_difference.sum());
        assert_relative_eq!(
            result.mean_difference,
            result.total_difference / 60.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn non_finite_samples_are_excluded_from_statistics() {
        let earlier = timed("2023-01-01", Raster::from_vec(vec![f64::NAN, 1.0, 1.0, 1.0], 1, 2, 2).unwrap());
        let later = timed("2023-02-01", Raster::from_vec(vec![9.0, 4.0, 0.0, 1.0], 1, 2, 2).unwrap());
        let result = compare_rasters(&earlier, &later).unwrap();

        assert!(result.difference[[0, 0, 0]].is_nan());
        assert_eq!(result.valid_count, 3);
        assert_relative_eq!(result.total_difference, 4.0);
        assert_relative_eq!(result.mean_difference, 4.0 / 3.0);
        assert_relative_eq!(result.max_difference, 3.0);
    }

    #[test]
    fn all_nodata_pair_has_zero_statistics() {
        let earlier = timed("2023-01-01", Raster::filled(1, 2, 2, f64::NAN));
        let later = timed("2023-02-01", Raster::filled(1, 2, 2, 1.0));
        let result = compare_rasters(&earlier, &later).unwrap();

        assert_eq!(result.valid_count, 0);
        assert_eq!(result.total_difference, 0.0);
        assert_eq!(result.mean_difference, 0.0);
        assert_eq!(result.max_difference, 0.0);
    }

    #[test]
    fn zero_baseline_gives_large_finite_percentage() {
        let earlier = timed("2023-01-01", Raster::filled(1, 1, 1, 0.0));
        let later = timed("2023-01-02", Raster::filled(1, 1, 1, 5.0));
        let result = compare_rasters(&earlier, &later).unwrap();

        let pct = result.percentage_change[[0, 0, 0]];
        assert_eq!(result.difference[[0, 0, 0]], 5.0);
        assert!(pct.is_finite());
        assert_relative_eq!(pct, 5.0 / PERCENT_EPSILON * 100.0, max_relative = 1e-12);
    }

    #[test]
    fn integer_sources_are_promoted_before_subtracting() {
        let earlier = TimedRaster::new(date("2023-01-01"), DateSource::IsoSegment, Raster::filled(1, 2, 2, 200u8));
        let later = TimedRaster::new(date("2023-01-02"), DateSource::IsoSegment, Raster::filled(1, 2, 2, 10u8));
        let result = compare_rasters(&earlier, &later).unwrap();
        assert_eq!(result.difference[[0, 1, 1]], -190.0);
        assert_eq!(result.total_difference, 760.0);
    }

    #[test]
    fn pairs_follow_sorted_dates() {
        let series: RasterSeries<f64> = ["2023-03-01", "2023-01-15", "2023-02-10"]
            .into_iter()
            .enumerate()
            .map(|(i, d)| timed(d, Raster::filled(1, 3, 3, i as f64)))
            .collect();

        let set = detect_changes(&series);
        assert_eq!(set.status(), DetectionStatus::Compared);
        assert_eq!(
            set.periods(),
            ["2023-01-15_to_2023-02-10", "2023-02-10_to_2023-03-01"]
        );
        assert!(set.get("2023-01-15_to_2023-03-01").is_none());
    }

    #[test]
    fn shape_mismatch_skips_only_that_pair() {
        let series: RasterSeries<f64> = vec![
            timed("2023-01-01", Raster::filled(1, 10, 10, 1.0)),
            timed("2023-02-01", Raster::filled(1, 12, 10, 2.0)),
            timed("2023-03-01", Raster::filled(1, 12, 10, 4.0)),
        ]
        .into_iter()
        .collect();

        let set = detect_changes(&series);

        assert_eq!(set.periods(), ["2023-02-01_to_2023-03-01"]);
        assert_eq!(
            set.skipped(),
            [SkippedPair {
                period: "2023-01-01_to_2023-02-01".to_string(),
                reason: SkipReason::ShapeMismatch {
                    earlier: (1, 10, 10),
                    later: (1, 12, 10),
                },
            }]
        );
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn shape_mismatch_is_logged_as_warning() {
        let series: RasterSeries<f64> = vec![
            timed("2023-01-01", Raster::filled(1, 2, 2, 1.0)),
            timed("2023-02-01", Raster::filled(1, 2, 3, 2.0)),
        ]
        .into_iter()
        .collect();

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let set = tracing::subscriber::with_default(subscriber, || detect_changes(&series));

        assert!(set.is_empty());
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(
            output.contains("2023-01-01_to_2023-02-01 have different shapes"),
            "{output}"
        );
    }

    #[test]
    fn empty_raster_fails_only_that_pair() {
        let series: RasterSeries<f64> = vec![
            timed("2023-01-01", Raster::new(1, 0, 0)),
            timed("2023-02-01", Raster::new(1, 0, 0)),
        ]
        .into_iter()
        .collect();

        let set = detect_changes(&series);
        assert!(set.is_empty());
        assert!(!set.is_insufficient());
        assert!(matches!(set.skipped()[0].reason, SkipReason::Failed(_)));
    }

    #[test]
    fn fewer_than_two_images_is_insufficient() {
        let series: RasterSeries<f64> = std::iter::once(timed("2023-01-01", Raster::filled(1, 2, 2, 1.0))).collect();
        let set = detect_changes(&series);
        assert!(set.is_empty());
        assert_eq!(set.status(), DetectionStatus::InsufficientData { available: 1 });

        let set = detect_changes(&RasterSeries::<f64>::new());
        assert_eq!(set.status(), DetectionStatus::InsufficientData { available: 0 });
    }

    #[test]
    fn detection_is_deterministic() {
        let series: RasterSeries<f64> = (1..=4)
            .map(|m| timed(&format!("2023-0{}-01", m), ramp(2, 8, 8, m as f64 * 0.37)))
            .collect();

        let first = detect_changes(&series);
        let second = detect_changes(&series);
        assert_eq!(first, second);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.total_difference.to_bits(), b.total_difference.to_bits());
            assert_eq!(a.mean_difference.to_bits(), b.mean_difference.to_bits());
        }
    }

    #[test]
    fn algorithm_trait() {
        let series: RasterSeries<f64> = vec![
            timed("2023-01-01", Raster::filled(1, 2, 2, 1.0)),
            timed("2023-01-02", Raster::filled(1, 2, 2, 3.0)),
        ]
        .into_iter()
        .collect();

        let set = ChangeDetector.execute_default(series).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(ChangeDetector.name(), "ChangeDetector");
    }
}
