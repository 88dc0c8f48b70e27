//! End-to-end change analysis: load, detect, render, export, estimate, report.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use geodelta_algorithms::change::{
    detect_changes, estimate_volumes, significant_fraction, ChangeResult, ChangeSet, SkippedPair,
    VolumeEstimate, VolumeParams, SIGNIFICANCE_FRACTION,
};
use geodelta_colormap::save_change_map;
use geodelta_core::io::{load_series, write_geotiff};
use geodelta_core::{DateSource, Raster, RasterSeries};

/// Everything a run needs; built from CLI arguments.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pixel_area: f64,
    /// Prefer the first image's geotransform over `pixel_area`
    pub area_from_georef: bool,
    pub render: bool,
    pub export_rasters: bool,
    pub report_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            pixel_area: VolumeParams::default().pixel_area,
            area_from_georef: false,
            render: true,
            export_rasters: false,
            report_path: None,
        }
    }
}

#[derive(Debug)]
pub enum PipelineOutcome {
    /// Fewer than two images were loaded; nothing was compared
    Insufficient { available: usize },
    /// Images loaded but every adjacent pair was skipped
    NoValidPairs { skipped: Vec<SkippedPair> },
    Completed(PipelineReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub date: String,
    pub source: DateSource,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFileSummary {
    pub path: PathBuf,
    pub reason: String,
}

/// Scalars and outputs of one analyzed period
#[derive(Debug, Clone, Serialize)]
pub struct ChangeSummary {
    pub period: String,
    pub from: String,
    pub to: String,
    pub total_difference: f64,
    pub mean_difference: f64,
    pub max_difference: f64,
    /// Samples with a finite difference; the others are nodata
    pub valid_samples: usize,
    pub significant_fraction: f64,
    pub volume: VolumeEstimate,
    pub change_map: Option<PathBuf>,
    pub difference_raster: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub input_dir: PathBuf,
    pub pixel_area: f64,
    pub images: Vec<ImageSummary>,
    pub skipped_files: Vec<SkippedFileSummary>,
    pub periods: Vec<ChangeSummary>,
    pub skipped_pairs: Vec<SkippedPair>,
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the full analysis described by `config`.
///
/// Per-file, per-pair and per-period output failures are logged and
/// skipped; only an unreadable input directory, an invalid pixel area or an
/// unwritable report abort the run. The pixel area is checked before
/// anything is read or written.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    VolumeParams::new(config.pixel_area)
        .validate()
        .context("Invalid --pixel-area")?;

    info!("Starting change analysis in {}", config.input_dir.display());

    let pb = spinner("Loading rasters...");
    let series: RasterSeries<f64> = load_series(&config.input_dir)
        .with_context(|| format!("Failed to load rasters from {}", config.input_dir.display()))?;
    pb.finish_and_clear();

    if series.len() < 2 {
        warn!(
            "Insufficient data: {} image(s) loaded, at least 2 are needed",
            series.len()
        );
        return Ok(PipelineOutcome::Insufficient {
            available: series.len(),
        });
    }

    let changes = detect_changes(&series);
    if changes.is_empty() {
        warn!(
            "Insufficient data: no valid image pair among {} images ({} skipped)",
            series.len(),
            changes.skipped().len()
        );
        return Ok(PipelineOutcome::NoValidPairs {
            skipped: changes.skipped().to_vec(),
        });
    }

    let params = volume_params(config, &series);
    let volumes = estimate_volumes(&changes, params).context("Volume estimation failed")?;

    let mut outputs: Vec<(Option<PathBuf>, Option<PathBuf>)> = Vec::new();
    if config.render || config.export_rasters {
        let pb = spinner("Writing outputs...");
        for result in &changes {
            let map = config
                .render
                .then(|| render_result(result, &config.output_dir))
                .flatten();
            let raster = config
                .export_rasters
                .then(|| export_difference(result, &config.output_dir))
                .flatten();
            outputs.push((map, raster));
        }
        pb.finish_and_clear();
    } else {
        outputs.resize(changes.len(), (None, None));
    }

    let report = build_report(config, &series, &changes, volumes, outputs, params.pixel_area);

    print_summary(&report);

    if let Some(path) = &config.report_path {
        write_report(&report, path)?;
    }

    info!("Analysis complete");
    Ok(PipelineOutcome::Completed(report))
}

fn volume_params(config: &PipelineConfig, series: &RasterSeries<f64>) -> VolumeParams {
    let fixed = VolumeParams::new(config.pixel_area);
    if !config.area_from_georef {
        return fixed;
    }
    let Some(first) = series.iter().next() else {
        return fixed;
    };
    let from_georef = VolumeParams::from_transform(first.raster.transform());
    if from_georef.pixel_area.is_finite() && from_georef.pixel_area > 0.0 {
        info!("Pixel area from geotransform: {}", from_georef.pixel_area);
        from_georef
    } else {
        warn!(
            "Geotransform of {} has no usable pixel area, using {}",
            first.date_key(),
            config.pixel_area
        );
        fixed
    }
}

fn render_result(result: &ChangeResult, output_dir: &Path) -> Option<PathBuf> {
    match save_change_map(result, output_dir) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Failed to render change map for {}: {}", result.period(), e);
            None
        }
    }
}

/// Signed difference of a period as a raster on the earlier image's grid
fn difference_raster(result: &ChangeResult) -> geodelta_core::Result<Raster<f64>> {
    Raster::from_parts(result.difference.clone(), result.georef.clone())
}

fn export_difference(result: &ChangeResult, output_dir: &Path) -> Option<PathBuf> {
    let path = output_dir.join(format!("difference_{}.tif", result.period()));
    let written = fs::create_dir_all(output_dir)
        .map_err(geodelta_core::Error::from)
        .and_then(|_| difference_raster(result))
        .and_then(|raster| write_geotiff(&raster, &path));
    match written {
        Ok(()) => {
            info!("Exported difference raster to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Failed to export difference for {}: {}", result.period(), e);
            None
        }
    }
}

fn build_report(
    config: &PipelineConfig,
    series: &RasterSeries<f64>,
    changes: &ChangeSet,
    volumes: Vec<VolumeEstimate>,
    outputs: Vec<(Option<PathBuf>, Option<PathBuf>)>,
    pixel_area: f64,
) -> PipelineReport {
    let images = series
        .iter()
        .map(|timed| ImageSummary {
            date: timed.date_key(),
            source: timed.source,
            path: timed.raster.georef().source.clone(),
        })
        .collect();

    let skipped_files = series
        .skipped()
        .iter()
        .map(|s| SkippedFileSummary {
            path: s.path.clone(),
            reason: s.reason.clone(),
        })
        .collect();

    let periods = changes
        .iter()
        .zip(volumes)
        .zip(outputs)
        .map(|((result, volume), (change_map, difference_raster))| ChangeSummary {
            period: result.period(),
            from: result.from.to_string(),
            to: result.to.to_string(),
            total_difference: result.total_difference,
            mean_difference: result.mean_difference,
            max_difference: result.max_difference,
            valid_samples: result.valid_count,
            significant_fraction: significant_fraction(result, SIGNIFICANCE_FRACTION),
            volume,
            change_map,
            difference_raster,
        })
        .collect();

    PipelineReport {
        input_dir: config.input_dir.clone(),
        pixel_area,
        images,
        skipped_files,
        periods,
        skipped_pairs: changes.skipped().to_vec(),
    }
}

fn print_summary(report: &PipelineReport) {
    println!();
    println!(
        "{:<26} {:>12} {:>12} {:>9} {:>14} {:>14} {:>14}",
        "Period", "Mean |d|", "Max |d|", "Signif.", "Removed", "Added", "Net"
    );
    for p in &report.periods {
        println!(
            "{:<26} {:>12.4} {:>12.4} {:>8.1}% {:>14.2} {:>14.2} {:>14.2}",
            p.period,
            p.mean_difference,
            p.max_difference,
            100.0 * p.significant_fraction,
            p.volume.material_removed,
            p.volume.material_added,
            p.volume.net_change
        );
    }
    for s in &report.skipped_pairs {
        println!("{:<26} skipped: {:?}", s.period, s.reason);
    }
    println!("Volumes are uncalibrated: pixel values are treated as heights.");
}

fn write_report(report: &PipelineReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geodelta_core::io::read_geotiff;
    use geodelta_core::GeoTransform;

    fn write_scene(dir: &Path, name: &str, values: Vec<f64>, rows: usize, cols: usize) {
        let mut raster = Raster::from_vec(values, 1, rows, cols).unwrap();
        raster.set_transform(GeoTransform::new(500_000.0, 4_000_000.0, 10.0, -10.0));
        write_geotiff(&raster, dir.join(name)).unwrap();
    }

    fn three_scene_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_scene(dir.path(), "site_20230301.tif", vec![5.0, 5.0, 5.0, 5.0], 2, 2);
        write_scene(dir.path(), "site_20230115.tif", vec![1.0, 1.0, 1.0, 1.0], 2, 2);
        write_scene(dir.path(), "site_20230210.tif", vec![3.0, 1.0, 1.0, 1.0], 2, 2);
        dir
    }

    #[test]
    fn full_run_writes_maps_rasters_and_report() {
        let input = three_scene_dir();
        let out = tempfile::tempdir().unwrap();
        let output_dir = out.path().join("results");
        let mut config = PipelineConfig::new(input.path(), &output_dir);
        config.export_rasters = true;
        config.report_path = Some(out.path().join("report.json"));

        let PipelineOutcome::Completed(report) = run(&config).unwrap() else {
            panic!("expected a completed run");
        };

        let periods: Vec<&str> = report.periods.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(
            periods,
            ["2023-01-15_to_2023-02-10", "2023-02-10_to_2023-03-01"]
        );
        assert!(output_dir.join("change_2023-01-15_to_2023-02-10.png").exists());
        assert!(output_dir.join("change_2023-02-10_to_2023-03-01.png").exists());

        let diff: Raster<f64> =
            read_geotiff(output_dir.join("difference_2023-01-15_to_2023-02-10.tif")).unwrap();
        assert_eq!(diff.get(0, 0, 0), Some(2.0));
        assert_eq!(diff.get(0, 1, 1), Some(0.0));

        let first = &report.periods[0];
        assert_relative_eq!(first.volume.material_added, 200.0);
        assert_relative_eq!(first.volume.net_change, 200.0);
        assert!(first.volume.uncalibrated);

        let json = fs::read_to_string(out.path().join("report.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["periods"].as_array().unwrap().len(), 2);
        assert_eq!(value["images"][0]["date"], "2023-01-15");
        assert_eq!(value["periods"][0]["volume"]["uncalibrated"], true);
    }

    #[test]
    fn no_render_writes_nothing() {
        let input = three_scene_dir();
        let out = tempfile::tempdir().unwrap();
        let output_dir = out.path().join("results");
        let mut config = PipelineConfig::new(input.path(), &output_dir);
        config.render = false;

        let PipelineOutcome::Completed(report) = run(&config).unwrap() else {
            panic!("expected a completed run");
        };
        assert_eq!(report.periods.len(), 2);
        assert!(report.periods.iter().all(|p| p.change_map.is_none()));
        assert!(!output_dir.exists());
    }

    #[test]
    fn single_image_is_insufficient() {
        let input = tempfile::tempdir().unwrap();
        write_scene(input.path(), "only_20230101.tif", vec![1.0; 4], 2, 2);
        let out = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(input.path(), out.path().join("results"));

        let outcome = run(&config).unwrap();
        assert!(matches!(outcome, PipelineOutcome::Insufficient { available: 1 }));
    }

    #[test]
    fn empty_directory_is_insufficient() {
        let input = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(input.path(), input.path().join("results"));
        assert!(matches!(
            run(&config).unwrap(),
            PipelineOutcome::Insufficient { available: 0 }
        ));
    }

    #[test]
    fn invalid_pixel_area_writes_nothing() {
        let input = three_scene_dir();
        let out = tempfile::tempdir().unwrap();
        let output_dir = out.path().join("results");
        let mut config = PipelineConfig::new(input.path(), &output_dir);
        config.pixel_area = -5.0;
        config.export_rasters = true;

        assert!(run(&config).is_err());
        assert!(!output_dir.join("change_2023-01-15_to_2023-02-10.png").exists());
        assert!(!output_dir.exists());
    }

    #[test]
    fn all_pairs_skipped_ends_early() {
        let input = tempfile::tempdir().unwrap();
        write_scene(input.path(), "a_20230101.tif", vec![1.0; 4], 2, 2);
        write_scene(input.path(), "b_20230201.tif", vec![1.0; 6], 2, 3);
        let out = tempfile::tempdir().unwrap();
        let output_dir = out.path().join("results");
        let config = PipelineConfig::new(input.path(), &output_dir);

        let PipelineOutcome::NoValidPairs { skipped } = run(&config).unwrap() else {
            panic!("expected the run to stop without valid pairs");
        };
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].period, "2023-01-01_to_2023-02-01");
        assert!(!output_dir.exists());
    }

    #[test]
    fn missing_input_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path().join("absent"), dir.path().join("results"));
        assert!(run(&config).is_err());
    }

    #[test]
    fn mismatched_scene_is_reported_as_skipped() {
        let input = tempfile::tempdir().unwrap();
        write_scene(input.path(), "a_20230101.tif", vec![1.0; 4], 2, 2);
        write_scene(input.path(), "b_20230201.tif", vec![1.0; 6], 2, 3);
        write_scene(input.path(), "c_20230301.tif", vec![2.0; 6], 2, 3);
        let out = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new(input.path(), out.path().join("results"));
        config.render = false;

        let PipelineOutcome::Completed(report) = run(&config).unwrap() else {
            panic!("expected a completed run");
        };
        assert_eq!(report.periods.len(), 1);
        assert_eq!(report.periods[0].period, "2023-02-01_to_2023-03-01");
        assert_eq!(report.skipped_pairs.len(), 1);
        assert_eq!(report.skipped_pairs[0].period, "2023-01-01_to_2023-02-01");
    }

    #[test]
    fn pixel_area_from_geotransform() {
        let input = three_scene_dir();
        let mut config = PipelineConfig::new(input.path(), input.path().join("results"));
        config.render = false;
        config.pixel_area = 1.0;
        config.area_from_georef = true;

        let PipelineOutcome::Completed(report) = run(&config).unwrap() else {
            panic!("expected a completed run");
        };
        // 10 m x 10 m pixels
        assert_relative_eq!(report.pixel_area, 100.0);
        // second period: differences 2, 4, 4, 4
        assert_relative_eq!(report.periods[1].volume.material_added, 1400.0);
    }
}
