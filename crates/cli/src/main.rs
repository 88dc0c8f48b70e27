//! GeoDelta CLI: change detection over a directory of dated GeoTIFFs

mod pipeline;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use pipeline::{run, PipelineConfig, PipelineOutcome};

#[derive(Parser)]
#[command(name = "geodelta")]
#[command(author, version, about = "Change detection over raster time series", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the dated .tif/.tiff images
    input_dir: PathBuf,

    /// Directory receiving change maps and exports
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    /// Ground area of one pixel, used for volume estimates
    #[arg(long, default_value = "100")]
    pixel_area: f64,

    /// Take the pixel area from the first image's geotransform
    #[arg(long)]
    area_from_georef: bool,

    /// Skip writing change-map PNGs
    #[arg(long)]
    no_render: bool,

    /// Also write each period's signed difference as a GeoTIFF
    #[arg(long)]
    export_rasters: bool,

    /// Write a JSON report of all periods to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

impl From<Cli> for PipelineConfig {
    fn from(cli: Cli) -> Self {
        let mut config = PipelineConfig::new(cli.input_dir, cli.output_dir);
        config.pixel_area = cli.pixel_area;
        config.area_from_georef = cli.area_from_georef;
        config.render = !cli.no_render;
        config.export_rasters = cli.export_rasters;
        config.report_path = cli.report;
        config
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = PipelineConfig::from(cli);
    match run(&config)? {
        PipelineOutcome::Insufficient { available } => {
            println!(
                "Insufficient data: found {} image(s) in {}, need at least 2",
                available,
                config.input_dir.display()
            );
        }
        PipelineOutcome::NoValidPairs { skipped } => {
            println!(
                "Insufficient data: none of the {} adjacent image pair(s) in {} could be compared",
                skipped.len(),
                config.input_dir.display()
            );
            for pair in &skipped {
                println!("  {} skipped: {:?}", pair.period, pair.reason);
            }
        }
        PipelineOutcome::Completed(report) => {
            println!(
                "\n{} period(s) analyzed, {} skipped. Results in {}",
                report.periods.len(),
                report.skipped_pairs.len(),
                config.output_dir.display()
            );
        }
    }
    Ok(())
}
