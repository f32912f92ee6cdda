//! Dataset preparation pipeline.
//!
//! Cleans a scraped `City,PostalCode` listing into one row per postal code,
//! attaches coordinates from an already geocoded `PostalCode,Latitude,Longitude`
//! table, and writes the dataset CSV used by `nearby`.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use postal_radius::cleaning::{read_raw_cities, split_city_rows};
use postal_radius::dataset::{load_coordinates, save_dataset};

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Build a postal code dataset from a scraped city listing")]
struct Args {
    /// Scraped City,PostalCode CSV
    #[arg(long)]
    cities: PathBuf,

    /// Geocoded PostalCode,Latitude,Longitude CSV (optional)
    #[arg(long)]
    coordinates: Option<PathBuf>,

    /// Output dataset CSV
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Postal code ingest");
    info!("Cities: {}", args.cities.display());

    let file = File::open(&args.cities).context("Failed to open cities file")?;
    let rows = read_raw_cities(BufReader::new(file)).context("Failed to parse cities file")?;
    info!("Read {} city rows", rows.len());

    let mut records = split_city_rows(rows);
    info!("Expanded to {} postal codes", records.len());

    if let Some(path) = &args.coordinates {
        let coordinates = load_coordinates(path)
            .with_context(|| format!("Failed to load coordinates {}", path.display()))?;

        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
                )?
                .progress_chars("#>-"),
        );

        let mut missing = 0usize;
        for record in records.iter_mut() {
            record.coordinate = coordinates.get(&record.postal_code).copied();
            if record.coordinate.is_none() {
                missing += 1;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if missing > 0 {
            warn!("{} postal codes have no coordinate", missing);
        }
    } else {
        warn!("No coordinates file given, writing dataset without coordinates");
    }

    save_dataset(&args.output, &records)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {} postal codes to {}", records.len(), args.output.display());

    Ok(())
}
