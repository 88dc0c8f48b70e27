//! Acquisition date resolution from file names
//!
//! The file stem is split on `_` and scanned left to right. The first
//! segment that looks like a date decides: eight ASCII digits are read as
//! `YYYYMMDD`, ten characters containing exactly two `-` as `YYYY-MM-DD`.
//! When no segment looks like a date, or the first candidate does not parse,
//! the file's filesystem timestamp is used instead.

use crate::error::Result;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Where a raster's date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSource {
    /// `YYYYMMDD` segment of the file name
    CompactSegment,
    /// `YYYY-MM-DD` segment of the file name
    IsoSegment,
    /// Filesystem creation (or modification) time
    FileTimestamp,
}

/// Outcome of looking for a date in a file stem
#[derive(Debug, Clone, PartialEq)]
pub enum StemDate {
    Found(NaiveDate, DateSource),
    /// A segment looked like a date but did not parse
    Invalid { segment: String, error: String },
    Missing,
}

fn is_compact_candidate(segment: &str) -> bool {
    segment.len() == 8 && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_iso_candidate(segment: &str) -> bool {
    segment.chars().count() == 10 && segment.matches('-').count() == 2
}

/// Find the acquisition date encoded in a file stem
pub fn date_from_stem(stem: &str) -> StemDate {
    for segment in stem.split('_') {
        let (format, source) = if is_compact_candidate(segment) {
            ("%Y%m%d", DateSource::CompactSegment)
        } else if is_iso_candidate(segment) {
            ("%Y-%m-%d", DateSource::IsoSegment)
        } else {
            continue;
        };

        return match NaiveDate::parse_from_str(segment, format) {
            Ok(date) => StemDate::Found(date, source),
            Err(e) => StemDate::Invalid {
                segment: segment.to_string(),
                error: e.to_string(),
            },
        };
    }
    StemDate::Missing
}

/// Local calendar date of a file's creation time, or its modification time
/// on filesystems that do not record creation
pub fn file_timestamp_date(path: &Path) -> Result<NaiveDate> {
    let metadata = std::fs::metadata(path)?;
    let time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(DateTime::<Local>::from(time).date_naive())
}

/// Resolve the date of a raster file, falling back to its timestamp
pub fn resolve_date(path: &Path) -> Result<(NaiveDate, DateSource)> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    match date_from_stem(&stem) {
        StemDate::Found(date, source) => return Ok((date, source)),
        StemDate::Invalid { segment, error } => warn!(
            "Error extracting date from {}: segment '{}' is not a valid date ({}); using file timestamp",
            stem, segment, error
        ),
        StemDate::Missing => warn!(
            "Could not extract date from filename {}, using file timestamp instead",
            stem
        ),
    }

    let date = file_timestamp_date(path)?;
    Ok((date, DateSource::FileTimestamp))
}
