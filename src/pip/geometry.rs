//! WKT multipolygon parsing.
//!
//! Only the outer ring of the first polygon is extracted. Holes and any
//! further polygons of a multipolygon are ignored: region lookups work on a
//! single ring per region.
//!
//! Pairs are returned in WKT axis order, `(x, y)` = `(lon, lat)`. Callers
//! convert them with [`Coordinate::from_xy`](crate::models::Coordinate::from_xy).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SitingError};

fn outer_ring_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // "(((" opens the first polygon's first ring; the ring ends at the first ")".
    PATTERN.get_or_init(|| Regex::new(r"\(\s*\(\s*\(([^()]*)\)").expect("static regex"))
}

/// Parse the outer ring of a WKT `MULTIPOLYGON`.
///
/// Returns an empty vector when the text contains no ring. A token that is not
/// a number fails with [`SitingError::Parse`] naming it.
pub fn parse_multipolygon(text: &str) -> Result<Vec<(f64, f64)>> {
    let Some(captures) = outer_ring_pattern().captures(text) else {
        return Ok(Vec::new());
    };
    let body = captures[1].trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    body.split(',').map(parse_position).collect()
}

/// Parse one `"x y [z ...]"` position. Extra ordinates are ignored.
fn parse_position(position: &str) -> Result<(f64, f64)> {
    let mut ordinates = position.split_whitespace().map(|token| {
        token
            .parse::<f64>()
            .map_err(|_| SitingError::parse(token, "geometry ordinate"))
    });

    let x = ordinates
        .next()
        .ok_or_else(|| SitingError::parse(position, "geometry position without ordinates"))??;
    let y = ordinates
        .next()
        .ok_or_else(|| SitingError::parse(position, "geometry position missing y"))??;

    // Still validate a Z/M ordinate if one is present.
    for extra in ordinates {
        extra?;
    }

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_ring() {
        let coords = parse_multipolygon("(((0 0, 1 0, 1 1, 0 1, 0 0)))").unwrap();
        assert_eq!(
            coords,
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn test_parse_keeps_lon_lat_order() {
        let coords =
            parse_multipolygon("MULTIPOLYGON (((-87.5 41.6, -87.4 41.6, -87.4 41.7, -87.5 41.6)))")
                .unwrap();
        assert_eq!(coords[0], (-87.5, 41.6));
        assert_eq!(coords.len(), 4);
    }

    #[test]
    fn test_parse_no_ring() {
        assert!(parse_multipolygon("").unwrap().is_empty());
        assert!(parse_multipolygon("POINT (1 2)").unwrap().is_empty());
        assert!(parse_multipolygon("MULTIPOLYGON EMPTY").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ignores_holes_and_other_polygons() {
        let wkt = "MULTIPOLYGON (((0 0, 4 0, 4 4, 0 4, 0 0), (1 1, 2 1, 2 2, 1 1)), ((10 10, 11 10, 11 11, 10 10)))";
        let coords = parse_multipolygon(wkt).unwrap();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords[2], (4.0, 4.0));
    }

    #[test]
    fn test_parse_bad_token() {
        let err = parse_multipolygon("(((0 0, 1 abc, 1 1)))").unwrap_err();
        match err {
            SitingError::Parse { token, .. } => assert_eq!(token, "abc"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_y() {
        assert!(parse_multipolygon("(((0 0, 1, 1 1)))").is_err());
    }

    #[test]
    fn test_parse_ignores_z() {
        let coords = parse_multipolygon("(((0 0 5, 1 0 5, 1 1 5)))").unwrap();
        assert_eq!(coords, vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
    }
}
