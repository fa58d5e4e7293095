//! Density clustering of points with geodesic distance.
//!
//! Two regimes are used: a coarse one for an unscoped point set and a fine
//! one for siting within a single region.

mod dbscan;
pub mod distance;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Coordinate;

pub use dbscan::dbscan;
pub use distance::{haversine_distance, EARTH_RADIUS_M};

/// Neighbourhood radius and density threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// ε, meters of great-circle distance
    pub eps_meters: f64,
    /// Neighbours (the point itself included) needed to be a core point
    pub min_pts: usize,
}

impl ClusterParams {
    /// Global hotspot search over an unscoped point set.
    pub const COARSE: ClusterParams = ClusterParams {
        eps_meters: 30_000.0,
        min_pts: 3,
    };

    /// Facility siting inside one region.
    pub const FINE: ClusterParams = ClusterParams {
        eps_meters: 500.0,
        min_pts: 2,
    };
}

/// A group of density-connected points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub size: usize,
    pub centroid: Coordinate,
    pub members: Vec<Coordinate>,
}

/// Cluster `points`, dropping noise. Clusters come back in discovery order.
pub fn cluster_points(points: &[Coordinate], params: ClusterParams) -> Vec<Cluster> {
    let labels = dbscan(points, params.eps_meters, params.min_pts);
    let count = labels.iter().flatten().max().map_or(0, |max| max + 1);

    let mut groups: Vec<Vec<Coordinate>> = vec![Vec::new(); count];
    for (point, label) in points.iter().zip(&labels) {
        if let Some(id) = label {
            groups[*id].push(*point);
        }
    }

    let clusters: Vec<Cluster> = groups
        .into_iter()
        .filter_map(|members| {
            Coordinate::mean(&members).map(|centroid| Cluster {
                size: members.len(),
                centroid,
                members,
            })
        })
        .collect();

    debug!(
        "Clustered {} points into {} clusters ({} noise)",
        points.len(),
        clusters.len(),
        labels.iter().filter(|l| l.is_none()).count()
    );

    clusters
}

/// Sort clusters largest first. Equal sizes keep their relative order.
pub fn rank_clusters(mut clusters: Vec<Cluster>) -> Vec<Cluster> {
    clusters.sort_by(|a, b| b.size.cmp(&a.size));
    clusters
}

/// Centroids of the `k` largest clusters, largest first.
pub fn top_centroids(points: &[Coordinate], params: ClusterParams, k: usize) -> Vec<Coordinate> {
    rank_clusters(cluster_points(points, params))
        .into_iter()
        .take(k)
        .map(|c| c.centroid)
        .collect()
}
