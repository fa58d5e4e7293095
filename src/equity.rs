//! Equity-based region selection and facility allocation.
//!
//! A region qualifies for new facilities when it is small and not wealthy, or
//! when it is poor regardless of size. The number of facilities is a crude
//! linear heuristic of how far below the thresholds a region sits; it is not a
//! calibrated demand model.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::Region;

pub const POP_THRESHOLD: f64 = 101.3;
pub const INCOME_THRESHOLD: i64 = 60_000;
pub const MIN_INCOME_THRESHOLD: i64 = 50_000;
pub const MAX_FACILITIES_PER_REGION: u32 = 2;

/// Population and income cutoffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EquityThresholds {
    /// Population cutoff, in the units of the population table
    pub population: f64,
    pub income: i64,
    /// Income under which a region qualifies whatever its population
    pub min_income: i64,
    pub max_facilities: u32,
}

impl Default for EquityThresholds {
    fn default() -> Self {
        Self {
            population: POP_THRESHOLD,
            income: INCOME_THRESHOLD,
            min_income: MIN_INCOME_THRESHOLD,
            max_facilities: MAX_FACILITIES_PER_REGION,
        }
    }
}

impl EquityThresholds {
    /// Whether a single region qualifies.
    ///
    /// Unknown population never qualifies. Unknown income with a known
    /// population does not either, as neither clause can be evaluated.
    pub fn qualifies(&self, region: &Region) -> bool {
        let (Some(population), Some(income)) = (region.population, region.income) else {
            return false;
        };
        (population < self.population && income < self.income) || income < self.min_income
    }

    /// `min(max, floor(P / max(pop, 1) + I / max(income, 1)))`
    pub fn facility_count(&self, population: f64, income: i64) -> u32 {
        let population_factor = self.population / population.max(1.0);
        let income_factor = self.income as f64 / income.max(1) as f64;
        let raw = (population_factor + income_factor).floor();
        if raw.is_nan() || raw <= 0.0 {
            return 0;
        }
        (raw.min(self.max_facilities as f64)) as u32
    }

    /// Regions that qualify for additional facilities, in input order.
    pub fn select_regions<'a>(&self, regions: &'a [Region]) -> Vec<&'a Region> {
        info!("Identifying underserved regions...");
        let selected: Vec<&Region> = regions.iter().filter(|r| self.qualifies(r)).collect();
        info!(
            "{} of {} regions qualify for additional facilities",
            selected.len(),
            regions.len()
        );
        selected
    }

    /// Set `facility_count` on each region from its demographics.
    pub fn allocate_facility_counts(&self, regions: &mut [Region]) {
        for region in regions.iter_mut() {
            region.facility_count = match (region.population, region.income) {
                (Some(population), Some(income)) => self.facility_count(population, income),
                _ => {
                    debug!("Region '{}' lacks demographics, allocating 0", region.name);
                    0
                }
            };
        }
    }
}

/// Select qualifying regions with the default thresholds.
pub fn select_regions(regions: &[Region]) -> Vec<&Region> {
    EquityThresholds::default().select_regions(regions)
}

/// Allocate facility counts with the default thresholds.
pub fn allocate_facility_counts(regions: &mut [Region]) {
    EquityThresholds::default().allocate_facility_counts(regions)
}
