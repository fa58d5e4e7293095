//! Snapping computed centroids onto real host locations.
//!
//! A plain linear scan over the candidate pool: it runs once per selected
//! centroid, and both the centroid count and the pool of fuel/parking hosts
//! are small, so O(centroids × candidates) is acceptable here.

use crate::cluster::haversine_distance;
use crate::error::{Result, SitingError};
use crate::models::{Coordinate, Facility};

/// Index of the candidate nearest to `target`. Ties go to the earliest candidate.
pub fn nearest_index(target: &Coordinate, candidates: &[Facility]) -> Result<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let mut distance = haversine_distance(target, &candidate.point());
        if distance.is_nan() {
            distance = f64::INFINITY;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i).ok_or(SitingError::UnresolvableSnap)
}

/// The candidate nearest to `target`.
pub fn nearest<'a>(target: &Coordinate, candidates: &'a [Facility]) -> Result<&'a Facility> {
    nearest_index(target, candidates).map(|i| &candidates[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, lat: f64, lon: f64) -> Facility {
        Facility::new(name, "parking", Coordinate::new(lat, lon))
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let err = nearest(&Coordinate::new(0.0, 0.0), &[]).unwrap_err();
        assert!(matches!(err, SitingError::UnresolvableSnap));
    }

    #[test]
    fn test_picks_nearest() {
        let pool = vec![
            host("far", 10.0, 10.0),
            host("near", 0.1, 0.1),
            host("mid", 1.0, 1.0),
        ];
        let got = nearest(&Coordinate::new(0.0, 0.0), &pool).unwrap();
        assert_eq!(got.name, "near");
    }

    #[test]
    fn test_tie_goes_to_first() {
        let pool = vec![host("east", 0.0, 1.0), host("west", 0.0, -1.0)];
        assert_eq!(nearest_index(&Coordinate::new(0.0, 0.0), &pool).unwrap(), 0);
    }

    #[test]
    fn test_nan_candidate_is_skipped() {
        let pool = vec![host("broken", f64::NAN, 0.0), host("ok", 5.0, 5.0)];
        assert_eq!(nearest_index(&Coordinate::new(0.0, 0.0), &pool).unwrap(), 1);
    }
}
