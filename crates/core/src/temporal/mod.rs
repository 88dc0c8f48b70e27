//! Date-keyed raster collections
//!
//! A [`RasterSeries`] maps calendar dates to rasters and always iterates in
//! ascending date order, whatever order the rasters were inserted in.

mod date;

pub use date::{date_from_stem, file_timestamp_date, resolve_date, DateSource, StemDate};

use crate::raster::{Raster, RasterElement};
use chrono::NaiveDate;
use std::collections::btree_map::{self, BTreeMap};
use std::path::PathBuf;

/// A raster tagged with the date it was acquired
#[derive(Debug, Clone)]
pub struct TimedRaster<T: RasterElement> {
    pub date: NaiveDate,
    /// How the date was obtained
    pub source: DateSource,
    pub raster: Raster<T>,
}

impl<T: RasterElement> TimedRaster<T> {
    pub fn new(date: NaiveDate, source: DateSource, raster: Raster<T>) -> Self {
        Self {
            date,
            source,
            raster,
        }
    }

    /// ISO-8601 date string (`YYYY-MM-DD`)
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// A file the loader could not turn into a [`TimedRaster`]
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Rasters keyed by unique date
#[derive(Debug, Clone)]
pub struct RasterSeries<T: RasterElement> {
    entries: BTreeMap<NaiveDate, TimedRaster<T>>,
    skipped: Vec<SkippedFile>,
}

impl<T: RasterElement> Default for RasterSeries<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T: RasterElement> RasterSeries<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raster, returning the one previously stored for that date
    pub fn insert(&mut self, timed: TimedRaster<T>) -> Option<TimedRaster<T>> {
        self.entries.insert(timed.date, timed)
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&TimedRaster<T>> {
        self.entries.get(date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending date order
    pub fn iter(&self) -> btree_map::Values<'_, NaiveDate, TimedRaster<T>> {
        self.entries.values()
    }

    /// Dates in ascending order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.entries.keys().copied().collect()
    }

    /// Consecutive `(earlier, later)` pairs in ascending date order
    pub fn adjacent_pairs(&self) -> Vec<(&TimedRaster<T>, &TimedRaster<T>)> {
        let entries: Vec<_> = self.entries.values().collect();
        entries.windows(2).map(|w| (w[0], w[1])).collect()
    }

    pub fn record_skip(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.skipped.push(SkippedFile {
            path: path.into(),
            reason: reason.into(),
        });
    }

    /// Files that were discovered but not loaded
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }
}

impl<T: RasterElement> FromIterator<TimedRaster<T>> for RasterSeries<T> {
    fn from_iter<I: IntoIterator<Item = TimedRaster<T>>>(iter: I) -> Self {
        let mut series = Self::new();
        for timed in iter {
            series.insert(timed);
        }
        series
    }
}

impl<'a, T: RasterElement> IntoIterator for &'a RasterSeries<T> {
    type Item = &'a TimedRaster<T>;
    type IntoIter = btree_map::Values<'a, NaiveDate, TimedRaster<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(date: &str, value: f64) -> TimedRaster<f64> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        TimedRaster::new(date, DateSource::IsoSegment, Raster::filled(1, 2, 2, value))
    }

    #[test]
    fn iterates_in_date_order() {
        let series: RasterSeries<f64> = ["2023-03-01", "2023-01-15", "2023-02-10"]
            .into_iter()
            .map(|d| timed(d, 0.0))
            .collect();

        let keys: Vec<String> = series.iter().map(TimedRaster::date_key).collect();
        assert_eq!(keys, ["2023-01-15", "2023-02-10", "2023-03-01"]);

        let pairs: Vec<(String, String)> = series
            .adjacent_pairs()
            .into_iter()
            .map(|(a, b)| (a.date_key(), b.date_key()))
            .collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("2023-01-15".to_string(), "2023-02-10".to_string()));
    }

    #[test]
    fn insert_replaces_same_date() {
        let mut series = RasterSeries::new();
        assert!(series.insert(timed("2023-01-15", 1.0)).is_none());
        let replaced = series.insert(timed("2023-01-15", 2.0)).unwrap();

        assert_eq!(replaced.raster.get(0, 0, 0), Some(1.0));
        assert_eq!(series.len(), 1);
        assert_eq!(series.iter().next().unwrap().raster.get(0, 0, 0), Some(2.0));
    }

    #[test]
    fn single_entry_has_no_pairs() {
        let series: RasterSeries<f64> = std::iter::once(timed("2023-01-15", 0.0)).collect();
        assert!(series.adjacent_pairs().is_empty());
    }
}
