//! Splitting of a raw acquisition stream into its component streams.
//!
//! Each extractor applies the physical sanity filters of its stream and preserves the input
//! order, so a stream sorted once by timestamp stays sorted.

use crate::dilution;
use crate::record::{
    CalibrationSample, EdgeCalibrationRecord, HousekeepingRecord, MeasurementRecord, RawRecord,
    SystemId, WindRecord,
};

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// Ambient measurement rows with positive concentration, temperature, humidity and pressure
///
/// Rows without a dry mole fraction have it derived from the wet reading.
pub fn extract_measurements(system_id: SystemId, raw: &[RawRecord]) -> Vec<MeasurementRecord> {
    raw.iter()
        .filter_map(|row| {
            let temperature = positive(row.temperature)?;
            let humidity = positive(row.humidity)?;
            let pressure = positive(row.pressure)?;
            let raw_dry_concentration = match (positive(row.co2), row.co2_dry) {
                (_, Some(dry)) => dry,
                (Some(wet), None) => dilution::wet_to_dry(wet, temperature, humidity, pressure),
                (None, None) => return None,
            };
            (raw_dry_concentration.is_finite() && raw_dry_concentration > 0.0).then_some(
                MeasurementRecord {
                    timestamp: row.timestamp,
                    system_id,
                    raw_dry_concentration,
                    temperature,
                    humidity,
                    pressure,
                },
            )
        })
        .collect()
}

/// Readings taken while a reference bottle was connected
pub fn extract_calibration_samples(
    system_id: SystemId,
    raw: &[RawRecord],
) -> Vec<CalibrationSample> {
    raw.iter()
        .filter_map(|row| {
            let bottle_id = row.cal_bottle_id.filter(|id| *id > 0)?;
            let measured_concentration = positive(row.cal_co2)?;
            positive(row.cal_temperature)?;
            positive(row.cal_pressure)?;
            row.cal_humidity.filter(|h| *h >= 0.0)?;
            Some(CalibrationSample {
                system_id,
                bottle_id,
                timestamp: row.timestamp,
                measured_concentration,
            })
        })
        .collect()
}

/// Wind rows, a non-positive direction marks a faulty anemometer reading
pub fn extract_wind(system_id: SystemId, raw: &[RawRecord]) -> Vec<WindRecord> {
    raw.iter()
        .filter_map(|row| {
            Some(WindRecord {
                timestamp: row.timestamp,
                system_id,
                speed: row.wind_speed?,
                direction: positive(row.wind_direction)?,
            })
        })
        .collect()
}

/// Housekeeping rows, a non-positive enclosure temperature marks a faulty reading
pub fn extract_housekeeping(system_id: SystemId, raw: &[RawRecord]) -> Vec<HousekeepingRecord> {
    raw.iter()
        .filter_map(|row| {
            Some(HousekeepingRecord {
                timestamp: row.timestamp,
                system_id,
                enclosure_temperature: positive(row.enclosure_temperature)?,
                enclosure_humidity: row.enclosure_humidity,
                enclosure_pressure: row.enclosure_pressure,
                cpu_temperature: row.cpu_temperature,
                ups_powered_by_grid: row.ups_powered_by_grid,
                ups_battery_charge: row.ups_battery_charge,
            })
        })
        .collect()
}

pub fn extract_edge_calibration(
    system_id: SystemId,
    raw: &[RawRecord],
) -> Vec<EdgeCalibrationRecord> {
    raw.iter()
        .filter_map(|row| {
            Some(EdgeCalibrationRecord {
                timestamp: row.timestamp,
                system_id,
                slope: positive(row.edge_slope)?,
                intercept: row.edge_intercept?,
                humidity_offset: row.edge_humidity_offset,
            })
        })
        .collect()
}
