//! Ray-casting point-in-polygon test.

use crate::models::Coordinate;

/// Test whether `point` lies inside `ring` using horizontal ray casting.
///
/// Longitude is the x axis and latitude the y axis. The ring does not need to
/// repeat its first vertex: the scan wraps around and visits `n + 1` edges.
/// An empty ring contains nothing.
///
/// Horizontal edges never reach the intersection computation, since
/// `y > min` and `y <= max` cannot both hold when `min == max`. Vertical edges
/// register a crossing without computing an intersection. Results for points
/// exactly on a vertex or edge follow from the comparisons below and are
/// stable across calls.
pub fn contains(point: &Coordinate, ring: &[Coordinate]) -> bool {
    if ring.is_empty() {
        return false;
    }

    let (x, y) = (point.lon, point.lat);
    let n = ring.len();
    let mut inside = false;

    let (mut p1x, mut p1y) = (ring[0].lon, ring[0].lat);
    for i in 0..=n {
        let (p2x, p2y) = (ring[i % n].lon, ring[i % n].lat);

        if y > p1y.min(p2y) && y <= p1y.max(p2y) && x <= p1x.max(p2x) {
            let crosses = if p1x == p2x {
                true
            } else if p1y != p2y {
                let x_intersection = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
                x <= x_intersection
            } else {
                false
            };
            if crosses {
                inside = !inside;
            }
        }

        p1x = p2x;
        p1y = p2y;
    }

    inside
}
