//! The siting pass: coverage, equity selection, per-region clustering,
//! snapping, the uncovered-region fallback and capacity weights.
//!
//! Regions are clustered independently, optionally on the rayon pool, and
//! merged by name before anything order-sensitive happens. Capacity draws
//! consume the seeded RNG only after that merge, so the same inputs and seed
//! always give the same report.
//!
//! Errors while clustering or snapping one region are scoped to it: the region
//! is logged, recorded in [`SitingReport::skipped`], and the pass continues.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashSet;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cluster::{cluster_points, rank_clusters, top_centroids};
use crate::config::Config;
use crate::error::{Result, SitingError};
use crate::models::{Coordinate, Facility, Region};
use crate::pip::{contains, points_within_bbox, RegionIndex};
use crate::snap::nearest_index;
use crate::weight::{condense, estimate_weight};

/// A region the pass could not place facilities in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRegion {
    pub region: String,
    pub reason: String,
}

/// Outcome of one siting pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SitingReport {
    /// Every input region, by name, with its count and assigned locations
    pub regions: Vec<Region>,

    /// Sited facilities in region-name order, capacity set
    pub facilities: Vec<Facility>,

    /// Regions no observation fell into
    pub uncovered: Vec<String>,

    pub skipped: Vec<SkippedRegion>,
}

pub struct SitingPipeline {
    config: Config,
}

impl SitingPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the siting pass.
    pub fn run(
        &self,
        regions: Vec<Region>,
        observations: &[Coordinate],
        candidates: &[Facility],
    ) -> SitingReport {
        self.run_with_progress(regions, observations, candidates, &ProgressBar::hidden())
    }

    /// Run the siting pass, ticking `progress` once per clustered region.
    pub fn run_with_progress(
        &self,
        regions: Vec<Region>,
        observations: &[Coordinate],
        candidates: &[Facility],
        progress: &ProgressBar,
    ) -> SitingReport {
        let pool = condense(candidates, self.config.weights.condense_cell_deg);
        info!(
            "Siting over {} regions, {} observations, {} host locations",
            regions.len(),
            observations.len(),
            pool.len()
        );

        let mut seen: HashSet<String> = HashSet::new();
        let regions: Vec<Region> = regions
            .into_iter()
            .filter(|region| {
                let first = seen.insert(region.name.clone());
                if !first {
                    warn!("Duplicate region name '{}', keeping the first", region.name);
                }
                first
            })
            .collect();

        let covered = self.covered_regions(&regions, observations);
        let selected: BTreeSet<String> = self
            .config
            .equity
            .select_regions(&regions)
            .into_iter()
            .map(|r| r.name.clone())
            .collect();

        let mut by_name: BTreeMap<String, Region> = regions
            .into_iter()
            .map(|region| (region.name.clone(), region))
            .collect();

        for name in &selected {
            if let Some(region) = by_name.get_mut(name) {
                self.config
                    .equity
                    .allocate_facility_counts(std::slice::from_mut(region));
            }
        }

        // Per-region clustering and snapping
        let work: Vec<&Region> = selected
            .iter()
            .filter_map(|name| by_name.get(name))
            .filter(|r| r.facility_count > 0)
            .collect();
        progress.set_length(work.len() as u64);

        let site = |region: &&Region| {
            let outcome = self.site_region(region, observations, &pool);
            progress.inc(1);
            (region.name.clone(), outcome)
        };
        let sited: BTreeMap<String, Result<Vec<usize>>> = if self.config.clustering.parallel {
            work.par_iter().map(site).collect()
        } else {
            work.iter().map(site).collect()
        };
        progress.finish_and_clear();

        let mut hosts: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut skipped: Vec<SkippedRegion> = Vec::new();
        for (name, outcome) in sited {
            match outcome {
                Ok(indices) => {
                    hosts.insert(name, indices);
                }
                Err(e) => {
                    warn!("Skipping region '{}': {}", name, e);
                    skipped.push(SkippedRegion {
                        region: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Uncovered-region fallback
        let all: BTreeSet<String> = by_name.keys().cloned().collect();
        let uncovered: Vec<String> = all.difference(&covered).cloned().collect();
        info!("{} regions contain no observations", uncovered.len());

        for name in &uncovered {
            if hosts.get(name).is_some_and(|h| !h.is_empty()) {
                continue;
            }
            if skipped.iter().any(|s| &s.region == name) {
                continue;
            }
            let Some(region) = by_name.get_mut(name) else {
                continue;
            };
            region.facility_count = 1;

            match self.resolve_fallback(region, observations, &pool) {
                Ok(index) => {
                    hosts.insert(name.clone(), vec![index]);
                }
                Err(e) => {
                    warn!("Skipping uncovered region '{}': {}", name, e);
                    skipped.push(SkippedRegion {
                        region: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        skipped.sort_by(|a, b| a.region.cmp(&b.region));

        // Capacities, drawn in region-name order
        let mut rng = StdRng::seed_from_u64(self.config.weights.seed);
        let mut facilities = Vec::new();
        for (name, indices) in &hosts {
            let Some(region) = by_name.get_mut(name) else {
                continue;
            };
            region.locations = indices.iter().map(|&i| pool[i].point()).collect();

            for &i in indices {
                let mut facility = pool[i].clone();
                facility.location.weight =
                    Some(estimate_weight(facility.location.count, &mut rng));
                facilities.push(facility);
            }
        }

        info!(
            "Sited {} facilities ({} regions skipped)",
            facilities.len(),
            skipped.len()
        );

        SitingReport {
            regions: by_name.into_values().collect(),
            facilities,
            uncovered,
            skipped,
        }
    }

    /// Names of the regions at least one observation falls into.
    ///
    /// Overlapping boundaries are reported once per set of regions involved;
    /// the point still counts for the first region in input order.
    pub fn covered_regions(
        &self,
        regions: &[Region],
        observations: &[Coordinate],
    ) -> BTreeSet<String> {
        let index = RegionIndex::build(regions);
        let mut covered = BTreeSet::new();
        let mut reported: HashSet<Vec<String>> = HashSet::new();

        for point in observations {
            let found = if self.config.clustering.check_overlaps {
                match index.locate_strict(point) {
                    Ok(found) => found.map(|r| r.name.clone()),
                    Err(SitingError::AmbiguousRegion { point, regions: names }) => {
                        if reported.insert(names.clone()) {
                            warn!(
                                "Point {} is contained by several regions: {}; counting it for '{}'",
                                point,
                                names.join(", "),
                                names[0]
                            );
                        } else {
                            debug!("Point {} is in overlapping regions", point);
                        }
                        names.into_iter().next()
                    }
                    Err(e) => {
                        warn!("Region lookup failed for {}: {}", point, e);
                        None
                    }
                }
            } else {
                index.find_region(point).map(|r| r.name.clone())
            };

            if let Some(name) = found {
                covered.insert(name);
            }
        }

        covered
    }

    /// Observations considered for a region: its bounding box, optionally
    /// clipped to the polygon.
    fn region_points(&self, region: &Region, observations: &[Coordinate]) -> Vec<Coordinate> {
        let mut points = points_within_bbox(region, observations);
        if self.config.clustering.clip_to_boundary {
            points.retain(|p| contains(p, &region.boundary));
        }
        points
    }

    /// Cluster a region's points and snap its largest clusters to hosts.
    fn site_region(
        &self,
        region: &Region,
        observations: &[Coordinate],
        pool: &[Facility],
    ) -> Result<Vec<usize>> {
        let points = self.region_points(region, observations);
        let centroids = top_centroids(
            &points,
            self.config.clustering.fine,
            region.facility_count as usize,
        );
        debug!(
            "Region '{}': {} points, {} of {} facilities placed",
            region.name,
            points.len(),
            centroids.len(),
            region.facility_count
        );
        snap_distinct(&region.name, &centroids, pool)
    }

    /// Pick a host for a region no observation fell into.
    ///
    /// Only points inside the polygon are clustered, whatever
    /// `clip_to_boundary` says; these exist only where an overlapping region
    /// claimed them first. Otherwise the boundary's area centroid is used.
    fn resolve_fallback(
        &self,
        region: &Region,
        observations: &[Coordinate],
        pool: &[Facility],
    ) -> Result<usize> {
        let mut points = points_within_bbox(region, observations);
        points.retain(|p| contains(p, &region.boundary));
        let target = top_centroids(&points, self.config.clustering.fine, 1)
            .into_iter()
            .next()
            .or_else(|| region.boundary_centroid())
            .ok_or_else(|| SitingError::NoUsableBoundary {
                region: region.name.clone(),
            })?;
        debug!("Region '{}' falls back to {}", region.name, target);
        nearest_index(&target, pool)
    }

    /// Coarse clustering over all observations, each cluster snapped to a host.
    ///
    /// Clusters are taken largest first. Fails if there are clusters but no hosts.
    pub fn hotspots(
        &self,
        observations: &[Coordinate],
        candidates: &[Facility],
    ) -> Result<Vec<Facility>> {
        let pool = condense(candidates, self.config.weights.condense_cell_deg);
        let clusters = rank_clusters(cluster_points(
            observations,
            self.config.clustering.coarse,
        ));
        info!("Found {} hotspot clusters", clusters.len());

        let centroids: Vec<Coordinate> = clusters.iter().map(|c| c.centroid).collect();
        let indices = snap_distinct("hotspots", &centroids, &pool)?;

        let mut rng = StdRng::seed_from_u64(self.config.weights.seed);
        Ok(indices
            .into_iter()
            .map(|i| {
                let mut facility = pool[i].clone();
                facility.location.weight =
                    Some(estimate_weight(facility.location.count, &mut rng));
                facility
            })
            .collect())
    }
}

/// Snap each centroid to its nearest host, dropping repeats of the same host.
fn snap_distinct(
    scope: &str,
    centroids: &[Coordinate],
    pool: &[Facility],
) -> Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut indices = Vec::with_capacity(centroids.len());
    for centroid in centroids {
        let index = nearest_index(centroid, pool)?;
        if seen.insert(index) {
            indices.push(index);
        } else {
            debug!("{}: centroid {} snaps to an already used host", scope, centroid);
        }
    }
    Ok(indices)
}
