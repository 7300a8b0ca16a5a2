//! CSV persistence of raw input and engine output.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{partition_by_year, AggregatedRecord};
use crate::record::{
    CalibrationCoefficient, Flag, FlaggedRecord, RawRecord, Resolution, SystemId,
};
use crate::{Error, Result};

/// Read a raw acquisition stream
///
/// Only the `timestamp` column is required, all other known columns are optional and unknown
/// columns are ignored.
///
/// # Errors
/// Returns an error if the file is missing, a required column is absent or a value cannot be
/// parsed.
pub fn read_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let file = fs::read(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(&file[..]);

    let mut records = vec![];
    for result in rdr.deserialize() {
        let record: RawRecord = result?;
        records.push(record);
    }
    Ok(records)
}

#[derive(Serialize)]
struct FlaggedRow {
    timestamp: DateTime<Utc>,
    system_id: SystemId,
    raw_dry_concentration: f64,
    temperature: f64,
    humidity: f64,
    pressure: f64,
    slope: f64,
    intercept: f64,
    resolution: Resolution,
    corrected_concentration: f64,
    flag: Flag,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    enclosure_temperature: Option<f64>,
    enclosure_humidity: Option<f64>,
    enclosure_pressure: Option<f64>,
    cpu_temperature: Option<f64>,
    ups_powered_by_grid: Option<f64>,
    ups_battery_charge: Option<f64>,
    edge_slope: Option<f64>,
    edge_intercept: Option<f64>,
    edge_humidity_offset: Option<f64>,
}

impl From<&FlaggedRecord> for FlaggedRow {
    fn from(flagged: &FlaggedRecord) -> Self {
        let record = &flagged.record;
        let measurement = &record.measurement;
        let housekeeping = record.housekeeping.as_ref();
        Self {
            timestamp: measurement.timestamp,
            system_id: measurement.system_id,
            raw_dry_concentration: measurement.raw_dry_concentration,
            temperature: measurement.temperature,
            humidity: measurement.humidity,
            pressure: measurement.pressure,
            slope: record.slope,
            intercept: record.intercept,
            resolution: record.resolution,
            corrected_concentration: record.corrected_concentration,
            flag: flagged.flag,
            wind_speed: record.wind.map(|wind| wind.speed),
            wind_direction: record.wind.map(|wind| wind.direction),
            enclosure_temperature: housekeeping.map(|h| h.enclosure_temperature),
            enclosure_humidity: housekeeping.and_then(|h| h.enclosure_humidity),
            enclosure_pressure: housekeeping.and_then(|h| h.enclosure_pressure),
            cpu_temperature: housekeeping.and_then(|h| h.cpu_temperature),
            ups_powered_by_grid: housekeeping.and_then(|h| h.ups_powered_by_grid),
            ups_battery_charge: housekeeping.and_then(|h| h.ups_battery_charge),
            edge_slope: record.edge_calibration.map(|edge| edge.slope),
            edge_intercept: record.edge_calibration.map(|edge| edge.intercept),
            edge_humidity_offset: record.edge_calibration.and_then(|edge| edge.humidity_offset),
        }
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write flagged records to a single CSV file
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_flagged(path: &Path, records: &[FlaggedRecord]) -> Result<()> {
    write_rows(path, records.iter().map(FlaggedRow::from))
}

/// Write flagged records of one system into one file per calendar year
///
/// Files are laid out as `<directory>/<year>/<prefix>_system-<id>.csv`. Returns the written paths
/// in year order.
///
/// # Errors
/// Returns an error if a directory or file cannot be created or written.
pub fn write_flagged_by_year(
    directory: &Path,
    system_id: SystemId,
    prefix: &str,
    records: &[FlaggedRecord],
) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];
    for (year, records) in partition_by_year(records) {
        let path = directory
            .join(year.to_string())
            .join(format!("{prefix}_system-{system_id}.csv"));
        write_flagged(&path, &records)?;
        paths.push(path);
    }
    Ok(paths)
}

/// Write the calibration coefficients of a run for auditing
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_coefficients(path: &Path, coefficients: &[CalibrationCoefficient]) -> Result<()> {
    write_rows(path, coefficients)
}

/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_aggregated(path: &Path, records: &[AggregatedRecord]) -> Result<()> {
    write_rows(path, records)
}
