//! TOML configuration shared by the binaries.
//!
//! ```toml
//! [dataset]
//! path = "data/germany_postal_codes_and_coordinates.csv"
//!
//! [query]
//! radius_km = 50.0
//! strategy = "bounding"
//! city_resolution = "centroid"
//!
//! [geodesy]
//! km_per_degree = 111.32
//! ```
//!
//! Every section and key is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::geodesy::Geodesy;
use crate::proximity::{CityResolution, ProximityEngine, SearchStrategy};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub query: QueryConfig,
    pub geodesy: Geodesy,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub radius_km: f64,
    pub strategy: SearchStrategy,
    pub city_resolution: CityResolution,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            radius_km: 50.0,
            strategy: SearchStrategy::Distance,
            city_resolution: CityResolution::FirstMatch,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Engine configured with this file's geodesy and city policy
    pub fn engine(&self) -> ProximityEngine {
        ProximityEngine::new(self.geodesy, self.query.city_resolution)
    }
}
