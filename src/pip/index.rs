//! Region lookup by containment, with bounding-box pre-filtering.
//!
//! Regions are tested in the order the caller supplied them and the first
//! containing region wins. There is no spatial tree: administrative regions
//! tile without overlap, and the region sets handled here are small. If two
//! polygons do overlap the answer depends on that order; use
//! [`RegionIndex::locate_strict`] to detect it.

use geo::{BoundingRect, LineString};
use tracing::info;

use super::ray::contains;
use crate::error::{Result, SitingError};
use crate::models::{Coordinate, Region};

/// `(min_lat, max_lat, min_lon, max_lon)`
pub type BoundingBox = (f64, f64, f64, f64);

/// Get the bounding box of a region's boundary, `None` if it has no geometry.
pub fn bounding_box(region: &Region) -> Option<BoundingBox> {
    if !region.has_geometry() {
        return None;
    }
    let ring: LineString<f64> = region
        .boundary
        .iter()
        .map(|c| (c.lon, c.lat))
        .collect::<Vec<_>>()
        .into();
    ring.bounding_rect()
        .map(|rect| (rect.min().y, rect.max().y, rect.min().x, rect.max().x))
}

fn bbox_contains(bbox: &BoundingBox, p: &Coordinate) -> bool {
    let (min_lat, max_lat, min_lon, max_lon) = *bbox;
    min_lat <= p.lat && p.lat <= max_lat && min_lon <= p.lon && p.lon <= max_lon
}

/// Keep the points inside a region's bounding box (edges included).
///
/// A coarse pre-filter: points in the box corners outside the polygon are kept.
pub fn points_within_bbox(region: &Region, points: &[Coordinate]) -> Vec<Coordinate> {
    match bounding_box(region) {
        Some(bbox) => points
            .iter()
            .filter(|p| bbox_contains(&bbox, p))
            .copied()
            .collect(),
        None => Vec::new(),
    }
}

/// Find the first region whose boundary contains `point`, testing every
/// region's full polygon.
pub fn find_region<'a>(point: &Coordinate, regions: &'a [Region]) -> Option<&'a Region> {
    regions.iter().find(|r| contains(point, &r.boundary))
}

struct IndexedRegion<'a> {
    region: &'a Region,
    bbox: BoundingBox,
}

/// Ordered region list with pre-computed bounding boxes.
pub struct RegionIndex<'a> {
    entries: Vec<IndexedRegion<'a>>,
}

impl<'a> RegionIndex<'a> {
    /// Build the index. Regions without geometry can never match and are left out.
    pub fn build(regions: &'a [Region]) -> Self {
        let entries: Vec<IndexedRegion<'a>> = regions
            .iter()
            .filter_map(|region| {
                bounding_box(region).map(|bbox| IndexedRegion { region, bbox })
            })
            .collect();

        info!(
            "Region index built with {} of {} regions",
            entries.len(),
            regions.len()
        );

        Self { entries }
    }

    fn candidates<'s>(&'s self, point: &'s Coordinate) -> impl Iterator<Item = &'a Region> + 's {
        self.entries
            .iter()
            .filter(move |e| bbox_contains(&e.bbox, point))
            .filter(move |e| contains(point, &e.region.boundary))
            .map(|e| e.region)
    }

    /// Find the first region containing `point`.
    pub fn find_region(&self, point: &Coordinate) -> Option<&'a Region> {
        self.candidates(point).next()
    }

    /// Like [`find_region`](Self::find_region), but fails when more than one
    /// region contains the point.
    pub fn locate_strict(&self, point: &Coordinate) -> Result<Option<&'a Region>> {
        let matches: Vec<&'a Region> = self.candidates(point).collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            _ => Err(SitingError::AmbiguousRegion {
                point: *point,
                regions: matches.iter().map(|r| r.name.clone()).collect(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str, min_lon: f64, min_lat: f64, size: f64) -> Region {
        let wkt = format!(
            "MULTIPOLYGON ((({x0} {y0}, {x1} {y0}, {x1} {y1}, {x0} {y1}, {x0} {y0})))",
            x0 = min_lon,
            y0 = min_lat,
            x1 = min_lon + size,
            y1 = min_lat + size
        );
        Region::from_wkt(name, &wkt).unwrap()
    }

    #[test]
    fn test_bounding_box() {
        let r = square("A", -10.0, 40.0, 2.0);
        assert_eq!(bounding_box(&r), Some((40.0, 42.0, -10.0, -8.0)));
        assert_eq!(bounding_box(&Region::new("Empty", vec![])), None);
    }

    #[test]
    fn test_points_within_bbox_inclusive() {
        let r = square("A", 0.0, 0.0, 1.0);
        let pts = vec![
            Coordinate::new(0.5, 0.5),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.5, 0.5),
        ];
        let kept = points_within_bbox(&r, &pts);
        assert_eq!(kept, vec![pts[0], pts[1]]);
    }

    #[test]
    fn test_find_region_first_match() {
        let regions = vec![square("A", 0.0, 0.0, 1.0), square("B", 1.0, 0.0, 1.0)];
        let index = RegionIndex::build(&regions);
        assert_eq!(
            index.find_region(&Coordinate::new(0.5, 1.5)).map(|r| r.name.as_str()),
            Some("B")
        );
        assert_eq!(
            find_region(&Coordinate::new(0.5, 0.5), &regions).map(|r| r.name.as_str()),
            Some("A")
        );
        assert!(index.find_region(&Coordinate::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_empty_regions_are_not_indexed() {
        let regions = vec![Region::new("Empty", vec![]), square("A", 0.0, 0.0, 1.0)];
        let index = RegionIndex::build(&regions);
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_overlap_is_order_dependent_and_detected() {
        let regions = vec![square("A", 0.0, 0.0, 2.0), square("B", 1.0, 1.0, 2.0)];
        let index = RegionIndex::build(&regions);
        let p = Coordinate::new(1.5, 1.5);

        assert_eq!(index.find_region(&p).map(|r| r.name.as_str()), Some("A"));
        match index.locate_strict(&p) {
            Err(SitingError::AmbiguousRegion { regions, .. }) => {
                assert_eq!(regions, vec!["A".to_string(), "B".to_string()])
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert_eq!(
            index
                .locate_strict(&Coordinate::new(0.5, 0.5))
                .unwrap()
                .map(|r| r.name.as_str()),
            Some("A")
        );
    }
}
