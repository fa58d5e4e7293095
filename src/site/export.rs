//! Writers for sited facilities: GeoJSON (default) or CSV by extension.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use sitewise::models::Facility;
use sitewise::SitingReport;

/// Output coordinate reference system.
pub const CRS: &str = "EPSG:4326";

#[derive(Debug, Serialize)]
struct FacilityRow<'a> {
    id: &'a str,
    latitude: f64,
    longitude: f64,
    capacity: Option<u8>,
    category: &'a str,
}

impl<'a> From<&'a Facility> for FacilityRow<'a> {
    fn from(facility: &'a Facility) -> Self {
        let point = facility.point();
        Self {
            id: &facility.name,
            latitude: point.lat,
            longitude: point.lon,
            capacity: facility.location.weight,
            category: &facility.category,
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Write facilities to `path`, choosing the format from its extension.
pub fn write_facilities(path: &Path, facilities: &[Facility]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    if is_csv(path) {
        let mut writer = csv::Writer::from_writer(file);
        for facility in facilities {
            writer.serialize(FacilityRow::from(facility))?;
        }
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &feature_collection(facilities))?;
        writer.flush()?;
    }

    info!("Wrote {} facilities to {}", facilities.len(), path.display());
    Ok(())
}

/// Build a GeoJSON FeatureCollection of point features.
pub fn feature_collection(facilities: &[Facility]) -> Value {
    let features: Vec<Value> = facilities
        .iter()
        .map(|facility| {
            let row = FacilityRow::from(facility);
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [row.longitude, row.latitude],
                },
                "properties": row,
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": CRS } },
        "features": features,
    })
}

pub fn write_report(path: &Path, report: &SitingReport) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
