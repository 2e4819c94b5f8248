use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use snowline_core::pipeline::{self, RunConfig};
use snowline_core::types::PlatformFilter;
use snowline_snap::{ExtractionOptions, SnapExtractor};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Extract snow-processor products for fixed ground stations from a folder
/// of Sentinel-3 OLCI scenes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder containing the unzipped .SEN3 scene directories
    #[arg(short = 'i', long)]
    insat: PathBuf,

    /// CSV with one `site_id,lat,lon` row per ground station
    #[arg(short = 'c', long)]
    coords: PathBuf,

    /// Output folder for checkpoint and consolidated files
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Switch the dirty-snow pollution flag on in the snow processor
    #[arg(short = 'p', long)]
    pollution: bool,

    /// Reflectance delta that triggers the pollution calculations
    #[arg(short = 'd', long = "delta_p", default_value_t = 0.1)]
    delta_p: f64,

    /// Apply vicarious calibration gains
    #[arg(short = 'g', long)]
    gains: bool,

    /// Run the DEM product plugin and emit the elevation column set
    #[arg(short = 'e', long)]
    elevation: bool,

    /// Salvage checkpoints from an interrupted run instead of extracting
    #[arg(short = 'r', long)]
    recovery: bool,

    /// Platforms to process: "A", "B" or "AB"
    #[arg(short = 'f', long, default_value = "AB")]
    platform: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = RunConfig {
        scene_root: cli.insat,
        coords_file: cli.coords,
        out_dir: cli.output,
        options: ExtractionOptions {
            pollution: cli.pollution,
            delta_p: cli.delta_p,
            gains: cli.gains,
            dem_products: cli.elevation,
        },
        platforms: PlatformFilter::parse(&cli.platform)?,
    };

    let report = if cli.recovery {
        pipeline::recover(&config)?
    } else {
        let extractor = SnapExtractor::from_env();
        pipeline::run(&config, &extractor)?
    };

    info!(
        found = report.scenes_found,
        checkpointed = report.scenes_checkpointed,
        skipped = report.scenes_skipped,
        "scene totals"
    );
    match &report.output {
        Some(path) => info!(path = %path.display(), "run complete"),
        None => info!("run complete, no output produced"),
    }

    Ok(())
}
