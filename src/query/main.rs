//! Proximity query CLI.
//!
//! Lists the postal codes within a radius of a reference postal code or
//! city, as text, JSON, or GeoJSON for map rendering.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use postal_radius::config::Config;
use postal_radius::dataset::load_dataset;
use postal_radius::export::{to_feature_collection, with_distances};
use postal_radius::proximity::{
    CityResolution, ProximityEngine, Query, QueryResult, Reference, SearchStrategy,
};
use postal_radius::GeoDataset;

#[derive(Parser, Debug)]
#[command(name = "nearby")]
#[command(about = "List postal codes within a radius of a postal code or city")]
struct Args {
    /// Dataset CSV (City,PostalCode,Latitude,Longitude), optionally .gz
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Reference postal code
    #[arg(short, long, conflicts_with = "city")]
    postal_code: Option<String>,

    /// Reference city name (exact, case-sensitive)
    #[arg(short, long)]
    city: Option<String>,

    /// Search radius in kilometers
    #[arg(short, long)]
    radius: Option<f64>,

    /// Search strategy: distance or bounding
    #[arg(short, long)]
    strategy: Option<SearchStrategy>,

    /// Coordinate used for a city with several postal codes
    #[arg(long, value_enum)]
    city_resolution: Option<CityPolicy>,

    /// JSON file with a list of queries to run in one go, e.g.
    /// `[{"reference": "10115", "radius_km": 50, "strategy": "bounding"}]`.
    /// `reference` is a postal code or city string, or one of
    /// `{"postal_code": ..}`, `{"city": ..}`, `{"any": ..}`; `strategy`
    /// defaults to `distance`.
    #[arg(long, conflicts_with_all = ["postal_code", "city"])]
    batch: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CityPolicy {
    FirstMatch,
    Centroid,
}

impl From<CityPolicy> for CityResolution {
    fn from(p: CityPolicy) -> Self {
        match p {
            CityPolicy::FirstMatch => CityResolution::FirstMatch,
            CityPolicy::Centroid => CityResolution::Centroid,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Geojson,
}

#[derive(Serialize)]
#[serde(untagged)]
enum BatchEntry {
    Ok(QueryResult),
    Err { error: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(policy) = args.city_resolution {
        config.query.city_resolution = policy.into();
    }

    let dataset_path = args
        .dataset
        .clone()
        .or_else(|| config.dataset.path.clone())
        .context("No dataset given (use --dataset or [dataset] path in the config)")?;
    let dataset = load_dataset(&dataset_path)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;

    let engine = config.engine();
    let strategy = args.strategy.unwrap_or(config.query.strategy);
    let radius = args.radius.unwrap_or(config.query.radius_km);

    if let Some(batch_path) = &args.batch {
        return run_batch(&engine, &dataset, batch_path);
    }

    let reference = Reference::from_parts(args.postal_code.as_deref(), args.city.as_deref())?;
    info!("Searching {} km around {} ({})", radius, reference, strategy);

    let result = engine.find_nearby(&dataset, &reference, radius, strategy)?;
    info!("Found {} postal codes", result.len());

    match args.format {
        OutputFormat::Text => print_text(&dataset, &result, &engine),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Geojson => {
            let fc = to_feature_collection(&dataset, &result, engine.geodesy());
            println!("{}", serde_json::to_string_pretty(&fc)?);
        }
    }

    Ok(())
}

fn run_batch(engine: &ProximityEngine, dataset: &GeoDataset, path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).context("Failed to read batch file")?;
    let queries: Vec<Query> = serde_json::from_str(&content).context("Failed to parse batch file")?;
    info!("Running {} queries", queries.len());

    let entries: Vec<BatchEntry> = engine
        .find_many(dataset, &queries)
        .into_iter()
        .map(|r| match r {
            Ok(result) => BatchEntry::Ok(result),
            Err(e) => BatchEntry::Err {
                error: e.to_string(),
            },
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn print_text(dataset: &GeoDataset, result: &QueryResult, engine: &ProximityEngine) {
    if result.is_empty() {
        println!("No nearby postal codes found.");
        return;
    }
    for (record, distance_km) in with_distances(dataset, result, engine.geodesy()) {
        println!(
            "{}\t{}\t{:.2} km",
            record.postal_code, record.city, distance_km
        );
    }
}
