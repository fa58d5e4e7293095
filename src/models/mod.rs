//! Core data models for the siting pipeline.

pub mod coordinate;
pub mod facility;
pub mod region;

pub use coordinate::{Coordinate, WeightedCoordinate};
pub use facility::{resolve_names, Facility};
pub use region::Region;
