//! CSV loaders for boundaries, demographics, observations and host locations.
//!
//! Any input may be gzip-compressed (`.gz`). Columns are located by header
//! name; numbers that fail to parse abort the run with the file and line.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use sitewise::models::{Coordinate, Facility, Region};
use sitewise::SitingError;

fn open_csv(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader))
}

/// Find the first header matching one of `names` (case-insensitive).
fn column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        .with_context(|| format!("Column '{}' not found", names[0]))
}

fn optional_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    column(headers, names).ok()
}

fn location(path: &Path, record: &StringRecord) -> String {
    match record.position() {
        Some(pos) => format!("{} line {}", path.display(), pos.line()),
        None => path.display().to_string(),
    }
}

/// Parse a required numeric field.
fn number<T: FromStr>(record: &StringRecord, idx: usize, path: &Path) -> Result<T> {
    let token = record.get(idx).unwrap_or("").trim();
    token
        .parse::<T>()
        .map_err(|_| SitingError::parse(token, location(path, record)).into())
}

/// Parse an optional numeric field; blank means unknown.
fn optional_number<T: FromStr>(
    record: &StringRecord,
    idx: usize,
    path: &Path,
) -> Result<Option<T>> {
    match record.get(idx).map(str::trim) {
        None | Some("") => Ok(None),
        Some(_) => number(record, idx, path).map(Some),
    }
}

fn text(record: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Load region boundaries, keeping rows whose type matches `region_type`.
pub fn load_regions(path: &Path, region_type: &str) -> Result<Vec<Region>> {
    info!("Loading region boundaries from {}", path.display());

    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();
    let geometry_idx = column(&headers, &["the_geom", "geometry", "wkt", "geom"])?;
    let type_idx = column(&headers, &["type", "kind", "region_type"])?;
    let name_idx = column(&headers, &["name", "namelsad"])?;

    let mut regions = Vec::new();
    for result in reader.records() {
        let record = result?;
        if !record
            .get(type_idx)
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(region_type))
        {
            continue;
        }

        let name = text(&record, Some(name_idx));
        let wkt = record.get(geometry_idx).unwrap_or("");
        let region = Region::from_wkt(&name, wkt).with_context(|| {
            format!(
                "Bad boundary for region '{}' ({})",
                name,
                location(path, &record)
            )
        })?;
        if !region.has_geometry() {
            warn!("Region '{}' has no usable boundary", name);
        }
        regions.push(region);
    }

    info!("Loaded {} {} regions", regions.len(), region_type);
    Ok(regions)
}

/// Load a two-column `name,value` table. Blank values are kept as unknown.
pub fn load_table<T: FromStr>(path: &Path) -> Result<HashMap<String, Option<T>>> {
    let mut reader = open_csv(path)?;
    let mut table = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let name = text(&record, Some(0));
        if name.is_empty() {
            continue;
        }
        table.insert(name, optional_number(&record, 1, path)?);
    }

    debug!("Loaded {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Join population and income onto regions by exact name.
pub fn enrich(
    regions: &mut [Region],
    population: &HashMap<String, Option<f64>>,
    income: &HashMap<String, Option<i64>>,
) {
    let mut missing = 0;
    for region in regions.iter_mut() {
        region.population = population.get(&region.name).copied().flatten();
        region.income = income.get(&region.name).copied().flatten();
        if region.population.is_none() || region.income.is_none() {
            missing += 1;
        }
    }
    info!("{} regions lack population or income data", missing);
}

/// Load points of interest with name, category and position.
pub fn load_points(path: &Path) -> Result<Vec<Facility>> {
    info!("Loading points from {}", path.display());

    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();
    let lat_idx = column(&headers, &["latitude", "lat", "y"])?;
    let lon_idx = column(&headers, &["longitude", "lon", "lng", "x"])?;
    let name_idx = optional_column(&headers, &["name"]);
    let category_idx = optional_column(&headers, &["category", "type", "amenity"]);

    let mut points = Vec::new();
    for result in reader.records() {
        let record = result?;
        let lat: f64 = number(&record, lat_idx, path)?;
        let lon: f64 = number(&record, lon_idx, path)?;
        points.push(Facility::new(
            text(&record, name_idx),
            text(&record, category_idx),
            Coordinate::new(lat, lon),
        ));
    }

    info!("Loaded {} points", points.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_regions_filters_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "places.csv",
            "the_geom,id,state,type,fips,name\n\
             \"MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))\",1,MN,county,27001,Aitkin\n\
             \"MULTIPOLYGON (((0 0, 2 0, 2 2, 0 0)))\",2,MN,city,27002,Duluth\n",
        );
        let regions = load_regions(&path, "county").unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].name, "Aitkin");
        assert_eq!(regions[0].boundary.len(), 4);
    }

    #[test]
    fn test_load_regions_bad_geometry_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "places.csv",
            "the_geom,type,name\n\"MULTIPOLYGON (((0 0, 1 q, 1 1)))\",county,Broken\n",
        );
        let err = load_regions(&path, "county").unwrap_err();
        assert!(format!("{err:#}").contains("Broken"));
    }

    #[test]
    fn test_enrich_by_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        let pop = write(&dir, "pop.csv", "county,population\nAitkin,15.7\nCass,\n");
        let inc = write(&dir, "inc.csv", "county,income\nAitkin,52000\naitkin,1\n");

        let mut regions = vec![Region::new("Aitkin", vec![]), Region::new("Cass", vec![])];
        enrich(
            &mut regions,
            &load_table::<f64>(&pop).unwrap(),
            &load_table::<i64>(&inc).unwrap(),
        );
        assert_eq!(regions[0].population, Some(15.7));
        assert_eq!(regions[0].income, Some(52_000));
        assert_eq!(regions[1].population, None);
        assert_eq!(regions[1].income, None);
    }

    #[test]
    fn test_load_points_bad_number_names_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "poi.csv",
            "id,source,category,name,latitude,longitude\n\
             1,osm,fuel,Shell,45.0,-93.0\n\
             2,osm,fuel,BP,north,-93.1\n",
        );
        let err = load_points(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("north"), "{message}");
        assert!(message.contains("line 3"), "{message}");
    }

    #[test]
    fn test_load_points_gz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder
            .write_all(b"latitude,longitude\n45.0,-93.0\n45.1,-93.1\n")
            .unwrap();
        encoder.finish().unwrap();

        let points = load_points(&path).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].point(), Coordinate::new(45.1, -93.1));
        assert_eq!(points[0].name, "");
    }
}
