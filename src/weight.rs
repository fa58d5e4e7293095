//! Capacity weights from observation counts.
//!
//! Busy places show up as many raw host records close together. The candidate
//! pool is first condensed onto a coarse grid, each surviving record carrying
//! how many records it absorbed, and that count is mapped onto a bounded
//! capacity scale.

use hashbrown::HashMap;
use rand::Rng;
use tracing::debug;

use crate::models::Facility;

/// Counts at or below this get a random capacity of 1 or 2.
pub const SMALL_COUNT_LIMIT: u32 = 87;
pub const MAX_WEIGHT: u8 = 14;

/// Grid cell, in degrees, used to condense the candidate pool.
pub const DEFAULT_CELL_DEG: f64 = 0.02;

/// Map an observation count to a capacity in `1..=14`.
///
/// Counts up to 87 draw uniformly from {1, 2} using `rng`. Larger counts use
/// `round(log_1000(n) * log_10(n^4) / 2)`, rounding half to even, capped at 14.
pub fn estimate_weight<R: Rng + ?Sized>(count: u32, rng: &mut R) -> u8 {
    if count <= SMALL_COUNT_LIMIT {
        return rng.gen_range(1..=2);
    }

    let n = count as f64;
    let log_1000 = n.ln() / 1000f64.ln();
    let log_10_pow4 = 4.0 * n.log10();
    let weight = (log_1000 * log_10_pow4 / 2.0).round_ties_even();

    weight.min(MAX_WEIGHT as f64) as u8
}

/// Condense facilities that share a grid cell into the first one seen.
///
/// Cells are keyed by `(trunc(lat / cell), trunc(lon / cell))`. The kept
/// facility's `count` becomes the sum of the counts in its cell, and cells
/// come out in the order they were first seen. A non-positive cell size
/// returns the input unchanged.
pub fn condense(pool: &[Facility], cell_deg: f64) -> Vec<Facility> {
    if !(cell_deg > 0.0) {
        return pool.to_vec();
    }

    let mut slots: HashMap<(i64, i64), usize> = HashMap::new();
    let mut condensed: Vec<Facility> = Vec::new();

    for facility in pool {
        let p = facility.point();
        let key = (
            (p.lat / cell_deg).trunc() as i64,
            (p.lon / cell_deg).trunc() as i64,
        );
        match slots.get(&key) {
            Some(&slot) => {
                let kept = &mut condensed[slot].location;
                kept.count = kept.count.saturating_add(facility.location.count);
            }
            None => {
                slots.insert(key, condensed.len());
                condensed.push(facility.clone());
            }
        }
    }

    debug!(
        "Condensed {} host records into {} locations",
        pool.len(),
        condensed.len()
    );
    condensed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_small_counts_are_one_or_two() {
        let mut rng = StdRng::seed_from_u64(7);
        for count in [0, 1, 50, 87] {
            for _ in 0..20 {
                let w = estimate_weight(count, &mut rng);
                assert!((1..=2).contains(&w), "count {count} gave {w}");
            }
        }
    }

    #[test]
    fn test_small_counts_are_seed_deterministic() {
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..16).map(|_| estimate_weight(50, &mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
    }

    #[test]
    fn test_formula_values() {
        let mut rng = StdRng::seed_from_u64(0);
        // 2/3 * log10(n)^2
        assert_eq!(estimate_weight(88, &mut rng), 3);
        assert_eq!(estimate_weight(1_000, &mut rng), 6);
        assert_eq!(estimate_weight(10_000, &mut rng), 11);
    }

    #[test]
    fn test_large_counts_are_capped() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(estimate_weight(1_000_000, &mut rng), 14);
        assert_eq!(estimate_weight(u32::MAX, &mut rng), 14);
    }

    fn host(lat: f64, lon: f64) -> Facility {
        Facility::new("h", "fuel", Coordinate::new(lat, lon))
    }

    #[test]
    fn test_condense_groups_by_cell() {
        let pool = vec![
            host(40.001, -75.001),
            host(40.005, -75.009),
            host(40.031, -75.001),
            host(40.019, -75.019),
        ];
        let out = condense(&pool, 0.02);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].point(), pool[0].point());
        assert_eq!(out[0].location.count, 3);
        assert_eq!(out[1].point(), pool[2].point());
        assert_eq!(out[1].location.count, 1);
    }

    #[test]
    fn test_condense_truncates_toward_zero() {
        // -0.01 and 0.01 both truncate to cell 0.
        let pool = vec![host(-0.01, 5.0), host(0.01, 5.0)];
        assert_eq!(condense(&pool, 0.02).len(), 1);
    }

    #[test]
    fn test_condense_disabled() {
        let pool = vec![host(1.0, 1.0), host(1.0, 1.0)];
        assert_eq!(condense(&pool, 0.0), pool);
    }
}
