use chrono::Duration;
use log::{info, warn};
use rayon::prelude::*;

use crate::aggregate::average_measurements;
use crate::align::{align_auxiliary, AuxiliaryStreams};
use crate::bottle::BottleRegistry;
use crate::calibration::{calibrate, extract_events};
use crate::config::Config;
use crate::correction::apply_correction;
use crate::despike::{despike, outlier_fraction};
use crate::extract::{
    extract_calibration_samples, extract_edge_calibration, extract_housekeeping,
    extract_measurements, extract_wind,
};
use crate::record::{CalibrationCoefficient, FlaggedRecord, RawRecord, SystemId};
use crate::timeline::CoefficientTimeline;
use crate::{BatchError, Error, Result, Stage};

/// Measurement rows are averaged to this grid before correction
const MEASUREMENT_INTERVAL_MINUTES: i64 = 1;

/// Every raw row of one system for one processing run
#[derive(Clone, Debug)]
pub struct SystemBatch {
    pub system_id: SystemId,
    pub records: Vec<RawRecord>,
}

impl SystemBatch {
    #[must_use]
    pub const fn new(system_id: SystemId, records: Vec<RawRecord>) -> Self {
        Self { system_id, records }
    }
}

#[derive(Clone, Debug)]
pub struct SystemOutput {
    pub system_id: SystemId,
    /// Flagged records in timestamp order
    pub records: Vec<FlaggedRecord>,
    /// Coefficients that survived the plausibility checks, in timestamp order
    pub coefficients: Vec<CalibrationCoefficient>,
    /// Share of records flagged by the despiker
    pub outlier_fraction: f64,
}

/// Results of all systems in a run, successful and failed
#[derive(Debug, Default)]
pub struct RunReport {
    pub outputs: Vec<SystemOutput>,
    pub failures: Vec<BatchError>,
}

/// Calibrate, correct, align and despike the records of one system
///
/// The raw stream is sorted by timestamp once, every later stage preserves that order. Measurement
/// rows are averaged to one-minute buckets before they are corrected.
///
/// # Errors
/// Returns a [`BatchError`] naming the failing stage if the system has no usable records or no
/// usable calibration.
pub fn process_system(
    mut batch: SystemBatch,
    registry: &BottleRegistry,
    config: &Config,
) -> std::result::Result<SystemOutput, BatchError> {
    let system_id = batch.system_id;
    let fail = |stage: Stage| move |source: Error| BatchError::new(system_id, stage, source);

    if batch.records.is_empty() {
        return Err(fail(Stage::Extraction)(Error::EmptySystem(system_id)));
    }
    batch.records.sort_by_key(|record| record.timestamp);
    let raw = batch.records;

    let measurements = average_measurements(
        &extract_measurements(system_id, &raw),
        Duration::minutes(MEASUREMENT_INTERVAL_MINUTES),
    );
    if measurements.is_empty() {
        return Err(fail(Stage::Extraction)(Error::EmptySystem(system_id)));
    }

    let samples = extract_calibration_samples(system_id, &raw);
    let events = extract_events(&samples, &config.calibration.bottle_bands);
    let coefficients = calibrate(&events, registry, &config.calibration);
    info!(
        "system {system_id}: {} calibration samples, {} bottle events, {} coefficients",
        samples.len(),
        events.len(),
        coefficients.len()
    );
    let timeline = CoefficientTimeline::new(system_id, &coefficients);

    let corrected = apply_correction(&measurements, &timeline, config.tolerance.calibration())
        .map_err(fail(Stage::Correction))?;

    let streams = AuxiliaryStreams {
        wind: extract_wind(system_id, &raw),
        housekeeping: extract_housekeeping(system_id, &raw),
        edge_calibration: extract_edge_calibration(system_id, &raw),
    };
    let aligned = align_auxiliary(corrected, &streams, &config.tolerance)
        .into_iter()
        .filter(|record| record.corrected_concentration > 0.0)
        .collect::<Vec<_>>();

    let records = despike(aligned, &config.despike);
    let outlier_fraction = outlier_fraction(&records);
    info!(
        "system {system_id}: {} records, detected spikes: {outlier_fraction:.4}",
        records.len()
    );

    Ok(SystemOutput {
        system_id,
        records,
        coefficients: timeline.coefficients().to_vec(),
        outlier_fraction,
    })
}

/// Process every system in parallel
///
/// A failing system is reported in [`RunReport::failures`] and does not affect the others. Both
/// lists are ordered by system id.
///
/// # Errors
/// Returns [`Error::Config`] if `config` is invalid, before any system is processed.
pub fn run(
    batches: Vec<SystemBatch>,
    registry: &BottleRegistry,
    config: &Config,
) -> Result<RunReport> {
    config.validate()?;

    let results = batches
        .into_par_iter()
        .map(|batch| process_system(batch, registry, config))
        .collect::<Vec<_>>();

    let mut report = RunReport::default();
    for result in results {
        match result {
            Ok(output) => report.outputs.push(output),
            Err(failure) => {
                warn!("{failure}");
                report.failures.push(failure);
            }
        }
    }
    report.outputs.sort_by_key(|output| output.system_id);
    report.failures.sort_by_key(|failure| failure.system_id);
    Ok(report)
}
