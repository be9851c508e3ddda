//! Geospatial and environmental dataset fetcher.
//!
//! Fetches a fixed set of external datasets (MODIS NDVI, OSM parks, GPWv4
//! population, air quality, demographics, temperature, land cover,
//! elevation tiles, sea level, and a Sentinel-2 NDVI export hand-off) and
//! saves each response under the data root. Datasets run sequentially;
//! individual failures are logged and the run continues.

mod config;
mod fetch;
mod runner;
mod sources;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{Credentials, SourcesConfig};
use fetch::Fetcher;
use runner::{Dataset, FetchContext};

#[derive(Parser, Debug)]
#[command(name = "fetcher")]
#[command(about = "Geospatial and environmental dataset fetcher")]
struct Args {
    /// Specific dataset to fetch (default: all)
    #[arg(short, long)]
    dataset: Option<String>,

    /// Root directory for downloaded data
    #[arg(long, env = "DATA_ROOT", default_value = "data/raw")]
    data_root: PathBuf,

    /// Sources configuration file
    #[arg(long, env = "SOURCES_CONFIG", default_value = "config/sources.yaml")]
    config: PathBuf,

    /// AOI GeoJSON for polygon-scoped datasets
    #[arg(long, env = "AOI_PATH", default_value = "config/aoi/california.geojson")]
    aoi: PathBuf,

    /// List available datasets and exit
    #[arg(long)]
    list: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let datasets = sources::registry();

    if args.list {
        for dataset in &datasets {
            println!("{}", dataset.name());
        }
        return Ok(());
    }

    info!("Starting environmental data fetch");

    tokio::fs::create_dir_all(&args.data_root).await?;

    let ctx = FetchContext {
        fetcher: Fetcher::new()?,
        config: SourcesConfig::load(&args.config)?,
        credentials: Credentials::from_env(),
        data_root: args.data_root,
        aoi_path: args.aoi,
    };

    let selected: Vec<Box<dyn Dataset>> = match &args.dataset {
        Some(name) => {
            let selected: Vec<Box<dyn Dataset>> = datasets
                .into_iter()
                .filter(|d| d.name() == name)
                .collect();
            if selected.is_empty() {
                bail!("Unknown dataset: {} (use --list to see available)", name);
            }
            selected
        }
        None => datasets,
    };

    let summary = runner::run(&selected, &ctx).await?;

    info!(
        datasets_ok = summary.datasets_ok,
        datasets_failed = summary.datasets_failed,
        files_written = summary.totals.written,
        files_skipped = summary.totals.skipped,
        files_failed = summary.totals.failed,
        total_bytes = summary.totals.bytes,
        "Fetch session complete"
    );

    Ok(())
}
