//! Sitewise - equity-driven facility siting over administrative regions.
//!
//! This library provides the geospatial core used by the `site` binary:
//! boundary parsing, point-in-polygon lookups, equity selection, geodesic
//! density clustering, snapping to real host locations and capacity weights.

pub mod cluster;
pub mod config;
pub mod equity;
pub mod error;
pub mod models;
pub mod pip;
pub mod pipeline;
pub mod snap;
pub mod weight;

pub use config::Config;
pub use error::{Result, SitingError};
pub use models::{Coordinate, Facility, Region, WeightedCoordinate};
pub use pipeline::{SitingPipeline, SitingReport};
