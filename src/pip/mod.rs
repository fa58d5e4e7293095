//! Point-in-Polygon (PIP) region lookup.
//!
//! Parses region boundaries from WKT and answers "which region contains this
//! point" with ray casting behind a bounding-box pre-filter.

pub mod geometry;
mod index;
mod ray;

pub use geometry::parse_multipolygon;
pub use index::{bounding_box, find_region, points_within_bbox, BoundingBox, RegionIndex};
pub use ray::contains;
