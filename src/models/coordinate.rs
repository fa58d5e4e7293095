//! Point value types.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lon) in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from a WKT-ordered `(x, y)` pair, i.e. `(lon, lat)`.
    pub const fn from_xy((x, y): (f64, f64)) -> Self {
        Self { lat: y, lon: x }
    }

    /// Bit-exact key, usable in hash sets.
    pub fn key(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }

    /// Arithmetic mean of a set of coordinates.
    ///
    /// Not geodesically correct; fine for the sub-kilometre clusters it is
    /// used on.
    pub fn mean<'a, I>(points: I) -> Option<Coordinate>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
        for p in points {
            lat += p.lat;
            lon += p.lon;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(Coordinate::new(lat / n as f64, lon / n as f64))
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// A coordinate carrying how many raw observations it stands for, and the
/// capacity weight derived from that count once estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedCoordinate {
    pub point: Coordinate,

    /// Number of raw records condensed into this point
    pub count: u32,

    /// Capacity in `1..=14`, unset until estimation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
}

impl WeightedCoordinate {
    pub fn new(point: Coordinate, count: u32) -> Self {
        Self {
            point,
            count,
            weight: None,
        }
    }

    pub fn single(point: Coordinate) -> Self {
        Self::new(point, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_empty_is_none() {
        assert!(Coordinate::mean(&Vec::<Coordinate>::new()).is_none());
    }

    #[test]
    fn test_mean() {
        let pts = [Coordinate::new(1.0, 10.0), Coordinate::new(3.0, 20.0)];
        assert_eq!(Coordinate::mean(&pts), Some(Coordinate::new(2.0, 15.0)));
    }

    #[test]
    fn test_from_xy_swaps_axes() {
        let c = Coordinate::from_xy((-122.4, 37.7));
        assert_eq!(c.lat, 37.7);
        assert_eq!(c.lon, -122.4);
    }
}
