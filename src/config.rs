use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cluster::ClusterParams;
use crate::equity::EquityThresholds;
use crate::weight::DEFAULT_CELL_DEG;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub equity: EquityThresholds,
    pub clustering: ClusteringConfig,
    pub weights: WeightConfig,
    pub sources: SourceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Per-region siting regime
    pub fine: ClusterParams,
    /// Global hotspot regime
    pub coarse: ClusterParams,
    /// Also require in-polygon containment after the bounding-box filter
    pub clip_to_boundary: bool,
    /// Warn about points contained by more than one region
    pub check_overlaps: bool,
    /// Cluster regions on the rayon thread pool
    pub parallel: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            fine: ClusterParams::FINE,
            coarse: ClusterParams::COARSE,
            clip_to_boundary: false,
            check_overlaps: true,
            parallel: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WeightConfig {
    /// Seed for the small-count capacity draw
    pub seed: u64,
    /// Grid cell (degrees) used to condense the candidate pool, 0 disables
    pub condense_cell_deg: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            condense_cell_deg: DEFAULT_CELL_DEG,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    /// Type discriminator of boundary rows to keep
    pub region_type: String,
    /// Name given to facilities whose host has none
    pub unnamed_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            region_type: "county".to_string(),
            unnamed_prefix: "EV Station".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
