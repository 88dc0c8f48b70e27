//! Directory loader for raster time series

use crate::error::{Error, Result};
use crate::io::read_geotiff;
use crate::maybe_rayon::*;
use crate::raster::RasterElement;
use crate::temporal::{resolve_date, RasterSeries, TimedRaster};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions recognized as rasters (compared case-insensitively)
pub const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Whether a path has a recognized raster extension
pub fn is_raster_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            RASTER_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// List raster files directly inside `dir`, sorted by file name
fn discover_rasters(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::Io(e.into())),
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_raster_path(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn load_one<T: RasterElement>(path: &Path) -> std::result::Result<TimedRaster<T>, String> {
    let (date, source) = resolve_date(path).map_err(|e| format!("no usable date: {}", e))?;
    let raster = read_geotiff::<T, _>(path).map_err(|e| e.to_string())?;
    Ok(TimedRaster::new(date, source, raster))
}

/// Load every raster in `dir` into a date-keyed series.
///
/// The scan is non-recursive and matches `.tif`/`.tiff` in any letter case.
/// A directory without rasters yields an empty series. Files whose date
/// cannot be resolved or whose contents fail to decode are logged, recorded
/// in [`RasterSeries::skipped`] and left out; the remaining files still load.
///
/// When two files resolve to the same date, the one later in file-name order
/// replaces the earlier one and a warning is logged.
pub fn load_series<T: RasterElement>(dir: impl AsRef<Path>) -> Result<RasterSeries<T>> {
    let dir = dir.as_ref();
    let paths = discover_rasters(dir)?;
    let mut series = RasterSeries::new();

    if paths.is_empty() {
        info!("No raster files found in {}", dir.display());
        return Ok(series);
    }
    info!("Found {} raster files in {}", paths.len(), dir.display());

    // Decoding may run in parallel; merging in path order keeps the
    // duplicate-date outcome identical to a sequential load.
    let loaded: Vec<_> = paths.par_iter().map(|path| load_one::<T>(path)).collect();

    for (path, outcome) in paths.iter().zip(loaded) {
        match outcome {
            Ok(timed) => {
                info!(
                    "Loaded {} for date {} with shape {:?}",
                    path.display(),
                    timed.date_key(),
                    timed.raster.shape()
                );
                debug!("{} date source: {:?}", path.display(), timed.source);
                let date_key = timed.date_key();
                if let Some(previous) = series.insert(timed) {
                    let previous_path = previous
                        .raster
                        .georef()
                        .source
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    warn!(
                        "Duplicate date {}: {} replaces {}",
                        date_key,
                        path.display(),
                        previous_path
                    );
                }
            }
            Err(reason) => {
                warn!("Error loading {}: {}", path.display(), reason);
                series.record_skip(path.clone(), reason);
            }
        }
    }

    Ok(series)
}
