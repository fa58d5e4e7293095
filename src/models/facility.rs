//! Facilities: candidate host locations and sited results.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use super::{Coordinate, WeightedCoordinate};

/// A point of interest: an existing host location or a sited facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,

    /// Source category (e.g. "fuel", "parking")
    pub category: String,

    pub location: WeightedCoordinate,
}

impl Facility {
    pub fn new(name: impl Into<String>, category: impl Into<String>, point: Coordinate) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            location: WeightedCoordinate::single(point),
        }
    }

    pub fn point(&self) -> Coordinate {
        self.location.point
    }
}

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of type {} at {}", self.name, self.category, self.point())?;
        if let Some(w) = self.location.weight {
            write!(f, " with a capacity of {}", w)?;
        }
        Ok(())
    }
}

fn is_unnamed(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("unamed") || name.eq_ignore_ascii_case("unnamed")
}

/// Make facility names unique.
///
/// Unnamed entries become `"{prefix} {n}"` with `n` their 1-based position.
/// Named entries get their occurrence number appended (`"Shell 1"`,
/// `"Shell 2"`, ...). If a generated name is already taken the suffix is
/// bumped until it is free.
pub fn resolve_names(facilities: &mut [Facility], unnamed_prefix: &str) {
    let mut occurrences: HashMap<String, u32> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();

    for (i, facility) in facilities.iter_mut().enumerate() {
        let (base, mut n) = if is_unnamed(&facility.name) {
            (unnamed_prefix.to_string(), i as u32 + 1)
        } else {
            let base = facility.name.trim().to_string();
            let seen = occurrences.entry(base.clone()).or_insert(0);
            *seen += 1;
            (base, *seen)
        };

        let mut candidate = format!("{} {}", base, n);
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{} {}", base, n);
        }
        taken.insert(candidate.clone());
        facility.name = candidate;
    }
}
