//! Administrative region with demographic enrichment.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Coordinate;
use crate::error::Result;
use crate::pip::geometry::parse_multipolygon;

/// An administrative region (county or equivalent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique region name, also the join key for enrichment tables
    pub name: String,

    /// Outer boundary ring. Empty means "no usable geometry".
    pub boundary: Vec<Coordinate>,

    /// Population in source units (e.g. thousands), unknown until enriched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<f64>,

    /// Median household income, unknown until enriched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<i64>,

    /// Number of new facilities this region should receive
    #[serde(default)]
    pub facility_count: u32,

    /// Locations assigned by the siting pass
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Coordinate>,
}

impl Region {
    /// Create a region, discarding a boundary with fewer than 3 distinct vertices.
    pub fn new(name: impl Into<String>, boundary: Vec<Coordinate>) -> Self {
        let name = name.into();
        let boundary = if boundary.is_empty() || distinct_vertices(&boundary) >= 3 {
            boundary
        } else {
            debug!(
                "Region '{}' boundary has fewer than 3 distinct vertices, treating as empty",
                name
            );
            Vec::new()
        };

        Self {
            name,
            boundary,
            population: None,
            income: None,
            facility_count: 0,
            locations: Vec::new(),
        }
    }

    /// Create a region from a WKT multipolygon (outer ring of the first polygon).
    pub fn from_wkt(name: impl Into<String>, wkt: &str) -> Result<Self> {
        let ring = parse_multipolygon(wkt)?
            .into_iter()
            .map(Coordinate::from_xy)
            .collect();
        Ok(Self::new(name, ring))
    }

    pub fn with_demographics(mut self, population: Option<f64>, income: Option<i64>) -> Self {
        self.population = population;
        self.income = income;
        self
    }

    pub fn has_geometry(&self) -> bool {
        !self.boundary.is_empty()
    }

    /// Area centroid of the boundary ring.
    pub fn boundary_centroid(&self) -> Option<Coordinate> {
        use geo::{Centroid, LineString, Polygon};

        if !self.has_geometry() {
            return None;
        }
        let ring: LineString<f64> = self
            .boundary
            .iter()
            .map(|c| (c.lon, c.lat))
            .collect::<Vec<_>>()
            .into();
        Polygon::new(ring, vec![])
            .centroid()
            .map(|p| Coordinate::new(p.y(), p.x()))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pop = self
            .population
            .map_or_else(|| "unknown".to_string(), |p| p.to_string());
        let inc = self
            .income
            .map_or_else(|| "unknown".to_string(), |i| i.to_string());
        write!(
            f,
            "{} has a population of {} and a median income of {}",
            self.name, pop, inc
        )
    }
}

fn distinct_vertices(ring: &[Coordinate]) -> usize {
    ring.iter().map(Coordinate::key).collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wkt() {
        let region =
            Region::from_wkt("Square", "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)))").unwrap();
        assert_eq!(region.boundary.len(), 5);
        assert_eq!(region.boundary[1], Coordinate::new(0.0, 1.0));
        assert_eq!(region.facility_count, 0);
        assert!(region.locations.is_empty());
    }

    #[test]
    fn test_degenerate_boundary_is_emptied() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let region = Region::new("Sliver", ring);
        assert!(!region.has_geometry());
    }

    #[test]
    fn test_boundary_centroid() {
        let region =
            Region::from_wkt("Square", "MULTIPOLYGON (((0 0, 2 0, 2 2, 0 2, 0 0)))").unwrap();
        let c = region.boundary_centroid().unwrap();
        assert!((c.lat - 1.0).abs() < 1e-12);
        assert!((c.lon - 1.0).abs() < 1e-12);

        assert!(Region::new("Empty", vec![]).boundary_centroid().is_none());
    }
}
