//! Facility siting CLI.
//!
//! Loads county boundaries, demographics, observed points and host
//! locations, runs the siting pass (or global hotspot analysis), and writes
//! the sited facilities as GeoJSON or CSV.

mod export;
mod sources;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use hashbrown::HashMap;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sitewise::models::{resolve_names, Coordinate, Facility};
use sitewise::{Config, SitingPipeline};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Equity-driven placement per region
    Siting,
    /// Coarse clustering over all observations
    Hotspots,
}

#[derive(Parser, Debug)]
#[command(name = "site")]
#[command(about = "Site new charging facilities in underserved regions")]
struct Args {
    /// Boundary CSV with WKT geometry, type and name columns
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Population table (name,value)
    #[arg(long)]
    population: Option<PathBuf>,

    /// Median income table (name,value)
    #[arg(long)]
    income: Option<PathBuf>,

    /// Observed points (latitude, longitude, optional name and category)
    #[arg(long)]
    observations: PathBuf,

    /// Candidate host locations
    #[arg(long)]
    candidates: PathBuf,

    /// Output path; .csv writes CSV, anything else GeoJSON
    #[arg(short, long, default_value = "facilities.geojson")]
    output: PathBuf,

    /// Write the full siting report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the capacity seed
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = Mode::Siting)]
    mode: Mode,

    /// Cluster regions on a single thread
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(seed) = args.seed {
        config.weights.seed = seed;
    }
    if args.sequential {
        config.clustering.parallel = false;
    }

    info!("Sitewise ({:?} mode)", args.mode);

    let observations: Vec<Coordinate> = sources::load_points(&args.observations)?
        .iter()
        .map(Facility::point)
        .collect();
    let candidates = sources::load_points(&args.candidates)?;
    if candidates.is_empty() {
        bail!(
            "No host locations in {}; nothing to snap to",
            args.candidates.display()
        );
    }

    let pipeline = SitingPipeline::new(config);

    let mut facilities = match args.mode {
        Mode::Hotspots => pipeline.hotspots(&observations, &candidates)?,
        Mode::Siting => {
            let Some(regions_path) = &args.regions else {
                bail!("--regions is required in siting mode");
            };
            let mut regions =
                sources::load_regions(regions_path, &pipeline.config().sources.region_type)?;

            let population: HashMap<String, Option<f64>> = match &args.population {
                Some(path) => sources::load_table(path)?,
                None => HashMap::new(),
            };
            let income: HashMap<String, Option<i64>> = match &args.income {
                Some(path) => sources::load_table(path)?,
                None => HashMap::new(),
            };
            if population.is_empty() || income.is_empty() {
                warn!("Population or income data missing; no region can qualify on equity");
            }
            sources::enrich(&mut regions, &population, &income);

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} regions",
                    )?
                    .progress_chars("#>-"),
            );

            let report = pipeline.run_with_progress(regions, &observations, &candidates, &pb);
            for skipped in &report.skipped {
                warn!("{}: {}", skipped.region, skipped.reason);
            }
            if let Some(path) = &args.report {
                export::write_report(path, &report)?;
                info!("Report written to {}", path.display());
            }
            report.facilities
        }
    };

    resolve_names(&mut facilities, &pipeline.config().sources.unnamed_prefix);
    for facility in &facilities {
        info!("{}", facility);
    }

    export::write_facilities(&args.output, &facilities)?;
    info!("Done");

    Ok(())
}
