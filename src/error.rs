//! Error types for the siting core.

use crate::models::Coordinate;

/// Errors raised by the siting core.
#[derive(Debug, thiserror::Error)]
pub enum SitingError {
    /// Malformed geometry token or unparseable numeric field.
    #[error("Failed to parse '{token}' ({context})")]
    Parse {
        /// The offending token, verbatim.
        token: String,
        /// Where the token was found.
        context: String,
    },

    /// Snapping was requested against an empty candidate pool.
    #[error("Cannot snap to a host location: candidate pool is empty")]
    UnresolvableSnap,

    /// More than one region polygon contains the same point.
    #[error("Point {point} is contained by several regions: {}", regions.join(", "))]
    AmbiguousRegion {
        point: Coordinate,
        regions: Vec<String>,
    },

    /// A fallback region has neither in-region points nor a usable boundary.
    #[error("Region '{region}' has no usable boundary to place a facility on")]
    NoUsableBoundary { region: String },
}

impl SitingError {
    pub fn parse(token: impl Into<String>, context: impl Into<String>) -> Self {
        SitingError::Parse {
            token: token.into(),
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SitingError>;
