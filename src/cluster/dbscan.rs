//! Grid-indexed DBSCAN over geodesic distance.
//!
//! Points are bucketed into cells at least ε wide in both axes, so every
//! ε-neighbour of a point lies in the 3×3 block of cells around it. The exact
//! haversine check then decides membership. Longitude cells are widened by
//! the latitude of the point furthest from the equator. The antimeridian is
//! not wrapped: points either side of ±180° are never neighbours.

use std::collections::VecDeque;

use hashbrown::HashMap;

use super::distance::{haversine_distance, meters_to_radians};
use crate::models::Coordinate;

type Cell = (i64, i64);

struct Grid {
    cell_lat: f64,
    cell_lon: f64,
    cells: HashMap<Cell, Vec<usize>>,
}

impl Grid {
    fn build(points: &[Coordinate], eps_m: f64) -> Self {
        let eps_rad = meters_to_radians(eps_m);
        // Rounding margin so a neighbour exactly ε away never falls two cells out.
        let margin = 1.0 + 1e-9;

        let cell_lat = (eps_rad.to_degrees() * margin).max(f64::MIN_POSITIVE);

        // sin(d/2R) >= cos(lat_max) * sin(dlon/2) bounds the longitude span.
        let max_abs_lat = points.iter().map(|p| p.lat.abs()).fold(0.0, f64::max);
        let ratio = (eps_rad / 2.0).sin() / max_abs_lat.to_radians().cos();
        let cell_lon = if ratio.is_finite() && ratio < 1.0 {
            ((2.0 * ratio.asin()).to_degrees() * margin).max(f64::MIN_POSITIVE)
        } else {
            // Near the poles every longitude may be a neighbour.
            f64::INFINITY
        };

        let mut grid = Self {
            cell_lat,
            cell_lon,
            cells: HashMap::new(),
        };
        for (i, p) in points.iter().enumerate() {
            let key = grid.cell_of(p);
            grid.cells.entry(key).or_default().push(i);
        }
        grid
    }

    fn cell_of(&self, p: &Coordinate) -> Cell {
        let row = (p.lat / self.cell_lat).floor() as i64;
        let col = if self.cell_lon.is_finite() {
            (p.lon / self.cell_lon).floor() as i64
        } else {
            0
        };
        (row, col)
    }

    /// Indices within `eps_m` of `points[i]`, the point itself included, ascending.
    fn neighbours(&self, points: &[Coordinate], i: usize, eps_m: f64) -> Vec<usize> {
        let p = &points[i];
        let (row, col) = self.cell_of(p);

        let mut found = Vec::new();
        for dr in -1..=1 {
            for dc in -1..=1 {
                if !self.cell_lon.is_finite() && dc != 0 {
                    continue;
                }
                let cell = (row.saturating_add(dr), col.saturating_add(dc));
                if let Some(members) = self.cells.get(&cell) {
                    found.extend(
                        members
                            .iter()
                            .copied()
                            .filter(|&j| haversine_distance(p, &points[j]) <= eps_m),
                    );
                }
            }
        }
        found.sort_unstable();
        found
    }
}

/// Label each point with its cluster id, `None` for noise.
///
/// Cluster ids are assigned in the order their first core point appears in
/// `points`. A border point reachable from several clusters joins the one
/// that reaches it first.
pub fn dbscan(points: &[Coordinate], eps_m: f64, min_pts: usize) -> Vec<Option<usize>> {
    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    if points.is_empty() {
        return labels;
    }

    let grid = Grid::build(points, eps_m);
    let mut visited = vec![false; points.len()];
    let mut next_cluster = 0;

    for i in 0..points.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seeds = grid.neighbours(points, i, eps_m);
        if seeds.len() < min_pts {
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster);

        let mut queue: VecDeque<usize> = seeds.into_iter().filter(|&j| j != i).collect();
        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;

            let reach = grid.neighbours(points, j, eps_m);
            if reach.len() >= min_pts {
                queue.extend(reach.into_iter().filter(|&k| labels[k].is_none() || !visited[k]));
            }
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::distance::EARTH_RADIUS_M;

    /// Offset a point by meters north/east (small distances only).
    fn offset(origin: Coordinate, north_m: f64, east_m: f64) -> Coordinate {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let dlon = (east_m / (EARTH_RADIUS_M * origin.lat.to_radians().cos())).to_degrees();
        Coordinate::new(origin.lat + dlat, origin.lon + dlon)
    }

    #[test]
    fn test_empty_input() {
        assert!(dbscan(&[], 500.0, 2).is_empty());
    }

    #[test]
    fn test_tight_group_and_noise() {
        let o = Coordinate::new(44.98, -93.27);
        let pts = vec![
            o,
            offset(o, 50.0, 0.0),
            offset(o, 0.0, 80.0),
            offset(o, 10_000.0, 0.0),
        ];
        let labels = dbscan(&pts, 500.0, 2);
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }

    #[test]
    fn test_chain_is_density_connected() {
        // Each hop is 400 m; ends are 1.6 km apart but connected through cores.
        let o = Coordinate::new(10.0, 20.0);
        let pts: Vec<_> = (0..5).map(|k| offset(o, 0.0, 400.0 * k as f64)).collect();
        let labels = dbscan(&pts, 500.0, 2);
        assert!(labels.iter().all(|l| *l == Some(0)));
    }

    #[test]
    fn test_min_pts_counts_the_point_itself() {
        let o = Coordinate::new(0.0, 0.0);
        let pair = vec![o, offset(o, 100.0, 0.0)];
        assert_eq!(dbscan(&pair, 500.0, 2), vec![Some(0), Some(0)]);
        assert_eq!(dbscan(&pair, 500.0, 3), vec![None, None]);
    }

    #[test]
    fn test_border_point_joins_cluster() {
        // a, b, c are within 300 m of each other; d is 450 m beyond c only.
        let o = Coordinate::new(-33.86, 151.21);
        let pts = vec![
            o,
            offset(o, 0.0, 150.0),
            offset(o, 0.0, 300.0),
            offset(o, 0.0, 750.0),
        ];
        let labels = dbscan(&pts, 500.0, 3);
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(0)]);
        // c sees all four points; with minPts 5 nobody is core.
        assert!(dbscan(&pts, 500.0, 5).iter().all(Option::is_none));
    }

    #[test]
    fn test_two_clusters_in_discovery_order() {
        let a = Coordinate::new(51.5, -0.12);
        let b = offset(a, 20_000.0, 0.0);
        let pts = vec![b, a, offset(a, 30.0, 30.0), offset(b, -40.0, 0.0)];
        let labels = dbscan(&pts, 500.0, 2);
        assert_eq!(labels, vec![Some(0), Some(1), Some(1), Some(0)]);
    }

    #[test]
    fn test_high_latitude_neighbours_across_longitude_cells() {
        let o = Coordinate::new(78.2, 15.6);
        let pts = vec![o, offset(o, 0.0, 450.0), offset(o, 0.0, 900.0)];
        let labels = dbscan(&pts, 500.0, 2);
        assert!(labels.iter().all(|l| *l == Some(0)));
    }

    #[test]
    fn test_coarse_regime() {
        let o = Coordinate::new(39.0, -105.0);
        let pts = vec![
            o,
            offset(o, 20_000.0, 0.0),
            offset(o, 0.0, 25_000.0),
            offset(o, 200_000.0, 0.0),
        ];
        let labels = dbscan(&pts, 30_000.0, 3);
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }
}
